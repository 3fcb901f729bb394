use indexmap::IndexMap;

use super::{Post, PostId};

/// Stable sort, most recently updated first. Ties keep server order.
pub fn sort_by_recent_update(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
}

/// Case-insensitive substring match over title, content and author.
/// `needle` must already be lowercased.
pub fn matches_search(post: &Post, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    post.title.to_lowercase().contains(needle)
        || post.content.to_lowercase().contains(needle)
        || post
            .author_name
            .as_deref()
            .is_some_and(|author| author.to_lowercase().contains(needle))
}

/// Canonical ordered post list keyed by id.
#[derive(Debug, Clone, Default)]
pub struct PostList {
    posts: IndexMap<PostId, Post>,
}

impl PostList {
    pub fn from_posts(posts: Vec<Post>) -> Self {
        let mut list = Self::default();
        list.replace_all(posts);
        list
    }

    /// Replaces the whole list, keeping the order given.
    pub fn replace_all(&mut self, posts: Vec<Post>) {
        self.posts = posts
            .into_iter()
            .map(|post| (post.id.clone(), post))
            .collect();
    }

    /// Swaps in a new version of an existing post without moving it.
    pub fn replace(&mut self, post: Post) -> bool {
        match self.posts.get_mut(&post.id) {
            Some(slot) => {
                *slot = post;
                true
            }
            None => false,
        }
    }

    pub fn sort_by_recent_update(&mut self) {
        self.posts
            .sort_by(|_, a, _, b| b.updated_at.cmp(&a.updated_at));
    }

    pub fn get(&self, id: &PostId) -> Option<&Post> {
        self.posts.get(id)
    }

    pub fn get_index(&self, index: usize) -> Option<&Post> {
        self.posts.get_index(index).map(|(_, post)| post)
    }

    pub fn position(&self, id: &PostId) -> Option<usize> {
        self.posts.get_index_of(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Post> {
        self.posts.values()
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

/// The home feed: canonical list plus the current search term. The visible
/// subset is derived and recomputed whenever either input changes.
#[derive(Debug, Clone, Default)]
pub struct FeedView {
    posts: PostList,
    query: String,
    visible: Vec<usize>,
}

impl FeedView {
    pub fn replace_posts(&mut self, posts: Vec<Post>) {
        self.posts.replace_all(posts);
        self.refilter();
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.refilter();
    }

    pub fn push_query_char(&mut self, ch: char) {
        self.query.push(ch);
        self.refilter();
    }

    pub fn pop_query_char(&mut self) {
        if self.query.pop().is_some() {
            self.refilter();
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn posts(&self) -> &PostList {
        &self.posts
    }

    pub fn visible(&self) -> impl Iterator<Item = &Post> {
        self.visible
            .iter()
            .filter_map(|index| self.posts.get_index(*index))
    }

    pub fn visible_at(&self, row: usize) -> Option<&Post> {
        self.visible
            .get(row)
            .and_then(|index| self.posts.get_index(*index))
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    pub fn get(&self, id: &PostId) -> Option<&Post> {
        self.posts.get(id)
    }

    fn refilter(&mut self) {
        let needle = self.query.to_lowercase();
        self.visible = self
            .posts
            .iter()
            .enumerate()
            .filter(|(_, post)| matches_search(post, &needle))
            .map(|(index, _)| index)
            .collect();
    }
}
