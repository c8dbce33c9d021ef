pub mod mapping;
pub mod pipelines;
pub mod run;
