//! # Comments Module
//!
//! Threaded page comments with votes, soft deletion and pinning.

pub mod errors;
pub mod model;
pub mod service;
pub mod sorter;

pub use errors::{CommentError, CommentResult};
pub use model::{Comment, CommentsDocument, SortOrder, VoteType, TOMBSTONE};
pub use service::{CommentService, NewComment};
pub use sorter::CommentSorter;
