#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use larder_client::{ClientResult, SuccessEnvelope};
use serde_json::Value;
use tempfile::{Builder, TempDir};

pub const RECIPES_CSV: &str = "\
Item name,Braised Beef (g),Flour (g),Egg(count),Green Onion (g)
Beef Noodle Soup,150,120,0,10
Scallion Pancake,0,80,1,15
Chicken Cutlet,0,30,1,
";

pub const MAY_EXPORT_CSV: &str = "\
Group,Count
Beef Noodle Soup,120
Scallion Pancake (8),60
Mai's BF Chicken Cutlet,40
Gift Card,3
";

pub const JUNE_EXPORT_CSV: &str = "\
Item name,Count
beef noodle soup,140
Scallion Pancake,66
Chicken Cutlet,50
Chicken Cutlet,n/a
";

pub const SHIPMENTS_CSV: &str = "\
Ingredient,Quantity per shipment,Number of shipments,frequency,Unit of shipment
Beef,40,1,weekly,lbs
Flour,50,2,biweekly,lbs
Egg,30,1,weekly,eggs
Green Onion,2,1,every other day,lbs
";

/// Scratch directory with an empty larder home so no user config leaks in.
pub fn temp_workspace(prefix: &str) -> std::io::Result<(TempDir, PathBuf)> {
    let dir = Builder::new().prefix(prefix).tempdir_in("/tmp")?;
    let home = dir.path().join("larder-home");
    fs::create_dir_all(&home)?;
    Ok((dir, home))
}

pub fn write_table(dir: &Path, name: &str, content: &str) -> std::io::Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, content)?;
    Ok(path)
}

pub struct Fixture {
    pub sales: Vec<PathBuf>,
    pub recipes: PathBuf,
    pub shipments: PathBuf,
}

pub fn write_fixture(dir: &Path) -> std::io::Result<Fixture> {
    Ok(Fixture {
        sales: vec![
            write_table(dir, "May_Data_Matrix.csv", MAY_EXPORT_CSV)?,
            write_table(dir, "June_Data_Matrix.csv", JUNE_EXPORT_CSV)?,
        ],
        recipes: write_table(dir, "recipes.csv", RECIPES_CSV)?,
        shipments: write_table(dir, "shipments.csv", SHIPMENTS_CSV)?,
    })
}

pub fn payload(result: ClientResult<SuccessEnvelope>) -> Value {
    assert!(result.is_ok(), "command failed: {:?}", result.as_ref().err());
    if let Ok(success) = result {
        let value = serde_json::to_value(success);
        assert!(value.is_ok());
        if let Ok(value) = value {
            return value;
        }
    }
    Value::Null
}

pub fn rows(payload: &Value) -> Vec<Value> {
    payload["data"]["rows"].as_array().cloned().unwrap_or_default()
}
