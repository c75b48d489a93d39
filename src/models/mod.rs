pub mod changelog;
pub mod create_meta;
pub mod field;
pub mod issue;
pub mod issue_key;
pub mod issue_type;
pub mod notification;
pub mod priority;
pub mod search;
pub mod status;
pub mod transition;
pub mod user;
pub mod worklog;

pub use changelog::*;
pub use create_meta::*;
pub use field::*;
pub use issue::*;
pub use issue_key::*;
pub use issue_type::*;
pub use notification::*;
pub use priority::*;
pub use search::*;
pub use status::*;
pub use transition::*;
pub use user::*;
pub use worklog::*;
