//! 翻译编排引擎
//!
//! 引擎的核心语义分四层：字段排除规则与结构保持翻译
//! （[`exclusion`]、[`fields`]）、单实体的幂等落库（[`resolver`]）、
//! 批量驱动（[`batch`]）和词汇表同步（[`glossary`]）。

pub mod batch;
pub mod exclusion;
pub mod fields;
pub mod glossary;
pub mod resolver;

pub use batch::{BatchDriver, BatchItemResult, BatchItemStatus, BatchResult};
pub use exclusion::FieldExclusionSet;
pub use fields::FieldTranslator;
pub use glossary::{GlossaryReconciler, SyncReport};
pub use resolver::UpsertResolver;
