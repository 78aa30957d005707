pub mod cli {
    pub mod parser;
}
pub mod config;
pub mod engine;
pub mod github {
    pub mod client;
    pub mod milestones;
}
pub mod output;
pub mod run;
pub mod storage;
