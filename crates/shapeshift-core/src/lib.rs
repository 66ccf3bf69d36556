//! Shapeshift Core - Plan-compiled object graph mapping
//!
//! This crate copies data between structurally similar but distinct types
//! described at run time: entities to DTOs, API models to domain models.
//!
//! # Main Components
//!
//! - **Type Model**: Class, enum and collection descriptors with compiled accessors
//! - **Scalar Conversion**: Lossless-where-possible conversion between built-in scalars
//! - **Plan Compiler**: Per type pair, a cached member-by-member mapping plan
//! - **Engine**: Eager execution of plans over object graphs and collections
//! - **Projections**: Pure expressions for deferred, per-element evaluation
//! - **Error Handling**: Error types using `thiserror` and `anyhow`
//!
//! # Example
//!
//! ```
//! use shapeshift_core::model::{ClassDescriptor, ScalarKind, TypeRef};
//! use shapeshift_core::{Mapper, Result, Value};
//!
//! fn example() -> Result<()> {
//!     let mapper = Mapper::new();
//!     let registry = mapper.registry();
//!     registry.register_class(
//!         ClassDescriptor::builder("Customer")
//!             .member("Id", TypeRef::scalar(ScalarKind::I32))
//!             .member("Name", TypeRef::scalar(ScalarKind::String))
//!             .build(),
//!     );
//!     registry.register_class(
//!         ClassDescriptor::builder("CustomerDto")
//!             .member("Id", TypeRef::scalar(ScalarKind::String))
//!             .member("Name", TypeRef::scalar(ScalarKind::String))
//!             .build(),
//!     );
//!
//!     let customer = registry
//!         .create_instance("Customer")?
//!         .with("Id", 7i32)?
//!         .with("Name", "Acme")?;
//!     let dto = mapper.adapt(&Value::Object(customer), "CustomerDto")?;
//!     assert_eq!(dto.as_object().unwrap().get("Id")?, Value::from("7"));
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

pub mod config;
pub mod convert;
pub mod engine;
pub mod error;
pub mod mapper;
pub mod model;
pub mod plan;
pub mod projection;
pub mod value;

// Re-export main types for convenience
pub use config::{ConfigRegistry, MapperSettings, PairConfigurator, PairKey, TypePairConfig};
pub use error::{Error, ErrorCategory, Result};
pub use mapper::{Mapper, Projection};
pub use model::{ClassDescriptor, EnumDescriptor, TypeRef, TypeRegistry};
pub use plan::{MappingPlan, PlanCompiler, PlanDescription};
pub use projection::{Expr, Lambda, ProjectionCompiler};
pub use value::{EnumValue, ObjectRef, Value};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
