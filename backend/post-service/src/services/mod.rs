/// Business logic layer for post-service
///
/// Services own the validation and multi-step write ordering; storage is
/// reached only through [`ContentStore`](crate::db::ContentStore).
pub mod comments;
pub mod likes;
pub mod posts;

pub use comments::CommentService;
pub use likes::LikeTarget;
pub use posts::PostService;
