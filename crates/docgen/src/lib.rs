//! Document generation from ODT templates
//!
//! This crate is the front end over `odt_engine`: it binds typed values to a
//! template, compiles it in an isolated build directory and converts the
//! result with an external office suite.
//!
//! # Example
//!
//! ```ignore
//! use docgen::{values_from_file, EngineSettings, Template};
//!
//! let template = Template::new(EngineSettings::load("docgen.json")?);
//! let values = values_from_file("invoice.json")?;
//! let compiled = template.compile("invoice.odt", &values)?;
//! template.to_pdf(&compiled, "invoice.pdf")?;
//! ```

pub mod context;
pub mod convert;
pub mod error;
pub mod settings;
pub mod template;
pub mod values;

pub use context::BuildContext;
pub use convert::Converter;
pub use error::{DocgenError, DocgenResult};
pub use settings::{ConverterSettings, EngineSettings, ImageMode};
pub use template::{CompiledDocument, Template, TEMPLATE_EXTENSIONS};
pub use values::{values_from_file, values_from_json, TemplateValue, Values};

pub use odt_engine::{Image, MarkerSyntax, Replacements};
