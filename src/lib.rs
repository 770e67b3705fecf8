pub mod config;
pub mod db;
pub mod pages;
pub mod query;

pub mod output {
    pub mod json;
    pub mod table;
}
