pub mod form_pipeline;

pub use form_pipeline::FormPipeline;
