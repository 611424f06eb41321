pub mod table_testkit;
