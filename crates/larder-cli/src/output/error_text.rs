use larder_client::ClientError;

pub fn render_error(error: &ClientError) -> String {
    let mut lines = vec![
        "The run stopped before producing a report.".to_string(),
        String::new(),
        format!("  Error:    {}", error.code),
        format!("  Details:  {}", error.message),
    ];

    if let Some(headers) = error
        .data
        .as_ref()
        .and_then(|data| data.get("actual_headers"))
        .and_then(|value| value.as_array())
    {
        let names = headers
            .iter()
            .filter_map(|header| header.as_str())
            .collect::<Vec<&str>>();
        lines.push(format!("  Found:    {}", names.join(", ")));
    }

    lines.push(String::new());
    lines.push("What to do next:".to_string());
    if error.recovery_steps.is_empty() {
        lines.push("  1. Check the input tables and retry.".to_string());
    } else {
        for (index, step) in error.recovery_steps.iter().enumerate() {
            lines.push(format!("  {}. {step}", index + 1));
        }
    }

    lines.join("\n")
}
