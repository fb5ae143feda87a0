pub mod classify;
pub mod constants;
pub mod digest;
pub mod error;
pub mod ignore;
pub mod layer;
pub mod layout;
pub mod logging;
pub mod manifest;
pub mod mediatype;
pub mod pack;
pub mod source;

pub use error::{PackError, Result};
pub use pack::{
    pack, pack_resolved, safe_ref_name, MediaTypeOverrides, PackMode, PackOptions, PackSummary,
    SpecKind,
};
