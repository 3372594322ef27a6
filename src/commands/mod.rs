pub mod comment;
pub mod render;

pub use comment::CommentCommand;
pub use render::RenderCommand;
