//! Comment ordering for page listings
//!
//! Pinned comments always come first; the requested order applies within
//! the pinned and unpinned groups.

use std::cmp::Ordering;

use super::model::{Comment, SortOrder};

/// Sorts comments for display
pub struct CommentSorter;

impl CommentSorter {
    /// Sorts comments in place.
    ///
    /// Sort is stable: comments that compare equal keep storage order.
    pub fn sort(comments: &mut [Comment], order: SortOrder) {
        comments.sort_by(|a, b| {
            // true sorts before false
            b.is_pinned
                .cmp(&a.is_pinned)
                .then_with(|| Self::compare(a, b, order))
        });
    }

    fn compare(a: &Comment, b: &Comment, order: SortOrder) -> Ordering {
        match order {
            SortOrder::Newest => b.created_at.cmp(&a.created_at),
            SortOrder::Oldest => a.created_at.cmp(&b.created_at),
            SortOrder::Top => b.score().cmp(&a.score()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use chrono::{Duration, Utc};
    use std::collections::BTreeSet;
    use uuid::Uuid;

    fn comment(text: &str, minutes_ago: i64, pinned: bool, likes: usize) -> Comment {
        Comment {
            id: Uuid::new_v4(),
            page_id: "p1".into(),
            user: "alice".into(),
            user_id: Some("1".into()),
            parent_id: None,
            text: text.into(),
            created_at: Utc::now() - Duration::minutes(minutes_ago),
            updated_at: None,
            is_pinned: pinned,
            is_deleted: false,
            likes: (0..likes).map(|i| i.to_string()).collect(),
            dislikes: BTreeSet::new(),
            role: Role::User,
            avatar: None,
        }
    }

    fn texts(comments: &[Comment]) -> Vec<&str> {
        comments.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn test_newest_first_with_pinned_on_top() {
        let mut comments = vec![
            comment("old", 30, false, 0),
            comment("pinned", 60, true, 0),
            comment("new", 1, false, 0),
        ];
        CommentSorter::sort(&mut comments, SortOrder::Newest);
        assert_eq!(texts(&comments), vec!["pinned", "new", "old"]);
    }

    #[test]
    fn test_oldest_first() {
        let mut comments = vec![comment("new", 1, false, 0), comment("old", 30, false, 0)];
        CommentSorter::sort(&mut comments, SortOrder::Oldest);
        assert_eq!(texts(&comments), vec!["old", "new"]);
    }

    #[test]
    fn test_equal_timestamps_keep_storage_order() {
        let at = Utc::now() - Duration::minutes(10);
        let stamped = |text: &str| {
            let mut c = comment(text, 0, false, 0);
            c.created_at = at;
            c
        };
        let mut comments = vec![stamped("a"), comment("older", 20, false, 0), stamped("b"), stamped("c")];

        CommentSorter::sort(&mut comments, SortOrder::Newest);
        assert_eq!(texts(&comments), vec!["a", "b", "c", "older"]);

        let mut comments = vec![stamped("a"), stamped("b"), comment("older", 20, false, 0), stamped("c")];
        CommentSorter::sort(&mut comments, SortOrder::Oldest);
        assert_eq!(texts(&comments), vec!["older", "a", "b", "c"]);
    }

    #[test]
    fn test_top_is_stable_for_ties() {
        let mut comments = vec![
            comment("a", 5, false, 1),
            comment("b", 4, false, 3),
            comment("c", 3, false, 1),
        ];
        CommentSorter::sort(&mut comments, SortOrder::Top);
        assert_eq!(texts(&comments), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_pinned_group_sorted_by_order() {
        let mut comments = vec![
            comment("p-low", 10, true, 0),
            comment("u-high", 10, false, 9),
            comment("p-high", 10, true, 2),
        ];
        CommentSorter::sort(&mut comments, SortOrder::Top);
        assert_eq!(texts(&comments), vec!["p-high", "p-low", "u-high"]);
    }
}
