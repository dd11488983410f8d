//! Content-change events delivered by the hook layer

use serde::Serialize;

/// Shape of a saved post, as reported by the hook that fired
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSnapshot {
    pub post_id: Option<u64>,
    pub post_type: String,
    /// Saved by the editor's autosave timer
    pub autosave: bool,
    /// A revision snapshot rather than the post itself
    pub revision: bool,
    /// Whether the post type is publicly visible
    pub public: bool,
}

impl PostSnapshot {
    /// A published, public post
    pub fn public(post_type: &str) -> Self {
        Self {
            post_id: None,
            post_type: post_type.to_string(),
            autosave: false,
            revision: false,
            public: true,
        }
    }
}

/// Something that may warrant a purge
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentChangeEvent {
    PostSaved(PostSnapshot),
    PostDeleted { post_id: Option<u64> },
    CommentChanged { comment_id: Option<u64> },
    TermChanged { term_id: Option<u64>, taxonomy: Option<String> },
    Manual,
    Scheduled,
}

/// Why an event was filtered out before consulting settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFilter {
    Autosave,
    Revision,
    NotPublic,
}

impl std::fmt::Display for EventFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventFilter::Autosave => f.write_str("autosave"),
            EventFilter::Revision => f.write_str("revision"),
            EventFilter::NotPublic => f.write_str("post type not public"),
        }
    }
}

impl ContentChangeEvent {
    /// Event-shape filtering. Only saved posts are ever filtered.
    pub fn filtered(&self) -> Option<EventFilter> {
        match self {
            ContentChangeEvent::PostSaved(post) if post.autosave => Some(EventFilter::Autosave),
            ContentChangeEvent::PostSaved(post) if post.revision => Some(EventFilter::Revision),
            ContentChangeEvent::PostSaved(post) if !post.public => Some(EventFilter::NotPublic),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ContentChangeEvent::PostSaved(_) => "post saved",
            ContentChangeEvent::PostDeleted { .. } => "post deleted",
            ContentChangeEvent::CommentChanged { .. } => "comment changed",
            ContentChangeEvent::TermChanged { .. } => "term changed",
            ContentChangeEvent::Manual => "manual",
            ContentChangeEvent::Scheduled => "scheduled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_post_passes() {
        let event = ContentChangeEvent::PostSaved(PostSnapshot::public("post"));
        assert_eq!(event.filtered(), None);
    }

    #[test]
    fn test_post_saved_filters() {
        let mut post = PostSnapshot::public("post");
        post.autosave = true;
        assert_eq!(
            ContentChangeEvent::PostSaved(post.clone()).filtered(),
            Some(EventFilter::Autosave)
        );

        post.autosave = false;
        post.revision = true;
        assert_eq!(
            ContentChangeEvent::PostSaved(post.clone()).filtered(),
            Some(EventFilter::Revision)
        );

        post.revision = false;
        post.public = false;
        assert_eq!(
            ContentChangeEvent::PostSaved(post).filtered(),
            Some(EventFilter::NotPublic)
        );
    }

    #[test]
    fn test_other_kinds_never_filtered() {
        let events = [
            ContentChangeEvent::PostDeleted { post_id: Some(1) },
            ContentChangeEvent::CommentChanged { comment_id: None },
            ContentChangeEvent::TermChanged {
                term_id: Some(3),
                taxonomy: Some("category".to_string()),
            },
            ContentChangeEvent::Manual,
            ContentChangeEvent::Scheduled,
        ];

        for event in events {
            assert_eq!(event.filtered(), None, "{} was filtered", event.label());
        }
    }
}
