//! Core types for context packs.

pub mod meta;
pub mod pack_id;
pub mod section;

pub use meta::{Meta, MetaValue, SubjectId};
pub use pack_id::{ContextPackId, PackIdError, PACK_ID_HEX_LEN};
pub use section::{RawContext, Section, DEFAULT_SECTION_WEIGHT};
