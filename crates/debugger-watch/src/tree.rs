//! Arena-backed watch tree.
//!
//! Nodes live in a slot vector and are addressed by generational [`ItemId`]
//! handles, so a handle to a destroyed item never aliases a new one. Parents
//! own their children; the child-to-parent link is a plain handle.
//!
//! The tree has an invisible root with five fixed category roots below it
//! (see [`RootKind`]). Those are never destroyed; only their children change.

use rustc_hash::FxHashMap;
use tracing::warn;

use crate::item::{ParsedItem, WatchItem};

/// Stable handle to a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemId {
    index: u32,
    generation: u32,
}

/// The fixed category roots, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RootKind {
    Locals,
    Inspector,
    Watchers,
    ReturnValue,
    Tooltip,
}

impl RootKind {
    pub const ALL: [RootKind; 5] = [
        Self::Locals,
        Self::Inspector,
        Self::Watchers,
        Self::ReturnValue,
        Self::Tooltip,
    ];

    #[must_use]
    pub fn iname(self) -> &'static str {
        match self {
            Self::Locals => "local",
            Self::Inspector => "inspect",
            Self::Watchers => "watch",
            Self::ReturnValue => "return",
            Self::Tooltip => "tooltip",
        }
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Locals => "Locals",
            Self::Inspector => "Inspector",
            Self::Watchers => "Expressions",
            Self::ReturnValue => "Return Value",
            Self::Tooltip => "Tooltip",
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Locals => 0,
            Self::Inspector => 1,
            Self::Watchers => 2,
            Self::ReturnValue => 3,
            Self::Tooltip => 4,
        }
    }
}

/// Outcome of [`WatchTree::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// Appended as a new child of its parent.
    Added(ItemId),
    /// Took the place of an item with the same iname.
    Replaced(ItemId),
    /// No item carries the parent iname; nothing changed.
    MissingParent,
    /// The iname belongs to a category root or to an ancestor of the
    /// insertion point; nothing changed.
    Conflict,
}

impl Insertion {
    #[must_use]
    pub fn id(self) -> Option<ItemId> {
        match self {
            Self::Added(id) | Self::Replaced(id) => Some(id),
            Self::MissingParent | Self::Conflict => None,
        }
    }

    #[must_use]
    pub fn is_added(self) -> bool {
        matches!(self, Self::Added(_))
    }
}

#[derive(Debug, Clone)]
struct Node {
    item: WatchItem,
    parent: Option<ItemId>,
    children: Vec<ItemId>,
}

#[derive(Debug, Clone, Default)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// The locals/watchers tree.
#[derive(Debug, Clone)]
pub struct WatchTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    inames: FxHashMap<String, ItemId>,
    root: ItemId,
    roots: [ItemId; 5],
}

impl Default for WatchTree {
    fn default() -> Self {
        Self::new()
    }
}

impl WatchTree {
    #[must_use]
    pub fn new() -> Self {
        let mut tree = Self {
            slots: Vec::new(),
            free: Vec::new(),
            inames: FxHashMap::default(),
            root: ItemId {
                index: 0,
                generation: 0,
            },
            roots: [ItemId {
                index: 0,
                generation: 0,
            }; 5],
        };
        tree.root = tree.alloc(WatchItem::default(), None);
        for kind in RootKind::ALL {
            let id = tree.alloc(WatchItem::new(kind.iname(), kind.title()), Some(tree.root));
            tree.attach(tree.root, id);
            tree.inames.insert(kind.iname().to_string(), id);
            tree.roots[kind.index()] = id;
        }
        tree
    }

    /// The invisible root above the category roots.
    #[must_use]
    pub fn root(&self) -> ItemId {
        self.root
    }

    #[must_use]
    pub fn category_root(&self, kind: RootKind) -> ItemId {
        self.roots[kind.index()]
    }

    #[must_use]
    pub fn is_category_root(&self, id: ItemId) -> bool {
        self.roots.contains(&id)
    }

    #[must_use]
    pub fn contains(&self, id: ItemId) -> bool {
        self.node(id).is_some()
    }

    #[must_use]
    pub fn get(&self, id: ItemId) -> Option<&WatchItem> {
        self.node(id).map(|node| &node.item)
    }

    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut WatchItem> {
        self.node_mut(id).map(|node| &mut node.item)
    }

    #[must_use]
    pub fn parent(&self, id: ItemId) -> Option<ItemId> {
        self.node(id).and_then(|node| node.parent)
    }

    #[must_use]
    pub fn children(&self, id: ItemId) -> &[ItemId] {
        self.node(id).map_or(&[], |node| node.children.as_slice())
    }

    #[must_use]
    pub fn child_count(&self, id: ItemId) -> usize {
        self.children(id).len()
    }

    /// Position of `id` among its siblings.
    #[must_use]
    pub fn row(&self, id: ItemId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|child| *child == id)
    }

    /// Distance from the invisible root (category roots are level 1).
    #[must_use]
    pub fn level(&self, id: ItemId) -> usize {
        let mut level = 0;
        let mut current = self.parent(id);
        while let Some(parent) = current {
            level += 1;
            current = self.parent(parent);
        }
        level
    }

    /// Exact iname lookup.
    #[must_use]
    pub fn find(&self, iname: &str) -> Option<ItemId> {
        self.inames.get(iname).copied()
    }

    /// Every node below `id` in pre-order, `id` excluded.
    #[must_use]
    pub fn descendants(&self, id: ItemId) -> Vec<ItemId> {
        let mut out = Vec::new();
        let mut stack: Vec<ItemId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Every item except the invisible root, in pre-order.
    pub fn items(&self) -> impl Iterator<Item = (ItemId, &WatchItem)> + '_ {
        self.descendants(self.root)
            .into_iter()
            .filter_map(move |id| self.get(id).map(|item| (id, item)))
    }

    /// Inserts a parsed item under the item named by its iname prefix.
    ///
    /// An existing item with the same iname is replaced at its row, keeping
    /// its handle; its old children are dropped. Inserting a category root
    /// iname replaces that root's children only.
    pub fn insert(&mut self, parsed: ParsedItem) -> Insertion {
        let iname = parsed.item.iname.clone();
        if let Some(kind) = RootKind::ALL.into_iter().find(|kind| kind.iname() == iname) {
            let root = self.category_root(kind);
            self.remove_children(root);
            for child in parsed.children {
                let _ = self.add_subtree(root, child);
            }
            return Insertion::Replaced(root);
        }

        let Some((parent_iname, _)) = iname.rsplit_once('.') else {
            warn!(%iname, "cannot insert item without parent iname");
            return Insertion::MissingParent;
        };
        let Some(parent) = self.find(parent_iname) else {
            warn!(%iname, "parent item not found, dropping insert");
            return Insertion::MissingParent;
        };

        let existing = self
            .children(parent)
            .iter()
            .copied()
            .find(|child| self.get(*child).is_some_and(|item| item.iname == iname));
        if let Some(id) = existing {
            self.remove_children(id);
            let ParsedItem { item, children } = parsed;
            if let Some(node) = self.node_mut(id) {
                node.item = item;
            }
            for child in children {
                let _ = self.add_subtree(id, child);
            }
            return Insertion::Replaced(id);
        }

        match self.add_subtree(parent, parsed) {
            Some(id) => Insertion::Added(id),
            None => Insertion::Conflict,
        }
    }

    /// Destroys `id` and everything below it. Category roots only lose
    /// their children.
    pub fn remove(&mut self, id: ItemId) -> bool {
        if id == self.root || self.is_category_root(id) {
            self.remove_children(id);
            return false;
        }
        let Some(parent) = self.parent(id) else {
            return false;
        };
        if let Some(node) = self.node_mut(parent) {
            node.children.retain(|child| *child != id);
        }
        self.free_subtree(id);
        true
    }

    pub fn remove_children(&mut self, id: ItemId) {
        let children = match self.node_mut(id) {
            Some(node) => std::mem::take(&mut node.children),
            None => return,
        };
        for child in children {
            self.free_subtree(child);
        }
    }

    /// Flags every item below `id` as outdated.
    pub fn mark_outdated(&mut self, id: ItemId) {
        for descendant in self.descendants(id) {
            if let Some(item) = self.get_mut(descendant) {
                item.outdated = true;
            }
        }
    }

    /// Destroys every item still flagged outdated and returns how many
    /// subtrees were removed.
    pub fn sweep_outdated(&mut self) -> usize {
        let mut doomed = Vec::new();
        let mut stack: Vec<ItemId> = self.children(self.root).to_vec();
        while let Some(id) = stack.pop() {
            match self.get(id) {
                Some(item) if item.outdated => doomed.push(id),
                Some(_) => stack.extend_from_slice(self.children(id)),
                None => {}
            }
        }
        for id in &doomed {
            self.remove(*id);
        }
        doomed.len()
    }

    /// Stable sort of the children of `id` by item name.
    pub fn sort_children_by_name(&mut self, id: ItemId) {
        let mut children = self.children(id).to_vec();
        children.sort_by(|a, b| {
            let a = self.get(*a).map_or("", |item| item.name.as_str());
            let b = self.get(*b).map_or("", |item| item.name.as_str());
            a.cmp(b)
        });
        if let Some(node) = self.node_mut(id) {
            node.children = children;
        }
    }

    /// Whether `ancestor` is `id` or lies on its path to the root.
    fn is_ancestor_or_self(&self, ancestor: ItemId, id: ItemId) -> bool {
        let mut current = Some(id);
        while let Some(next) = current {
            if next == ancestor {
                return true;
            }
            current = self.parent(next);
        }
        false
    }

    /// Attaches `parsed` and its children below `parent`. An item whose
    /// iname is already taken elsewhere replaces the holder, unless the
    /// holder is a category root or encloses `parent`; then the incoming
    /// subtree is dropped and `None` returned.
    fn add_subtree(&mut self, parent: ItemId, parsed: ParsedItem) -> Option<ItemId> {
        let ParsedItem { item, children } = parsed;
        if let Some(stale) = self.find(&item.iname) {
            if self.is_category_root(stale) || self.is_ancestor_or_self(stale, parent) {
                warn!(iname = %item.iname, "reply item collides with an enclosing item, dropped");
                return None;
            }
            warn!(iname = %item.iname, "duplicate iname in reply, keeping the later item");
            self.remove(stale);
        }
        let iname = item.iname.clone();
        let id = self.alloc(item, Some(parent));
        if !iname.is_empty() {
            self.inames.insert(iname, id);
        }
        self.attach(parent, id);
        for child in children {
            let _ = self.add_subtree(id, child);
        }
        Some(id)
    }

    fn attach(&mut self, parent: ItemId, child: ItemId) {
        if let Some(node) = self.node_mut(parent) {
            node.children.push(child);
        }
    }

    fn alloc(&mut self, item: WatchItem, parent: Option<ItemId>) -> ItemId {
        let node = Node {
            item,
            parent,
            children: Vec::new(),
        };
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            ItemId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            ItemId {
                index,
                generation: 0,
            }
        }
    }

    fn free_subtree(&mut self, id: ItemId) {
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let Some(slot) = self.slots.get_mut(next.index as usize) else {
                continue;
            };
            if slot.generation != next.generation {
                continue;
            }
            let Some(node) = slot.node.take() else {
                continue;
            };
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(next.index);
            if self.inames.get(&node.item.iname) == Some(&next) {
                self.inames.remove(&node.item.iname);
            }
            stack.extend(node.children);
        }
    }

    fn node(&self, id: ItemId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    fn node_mut(&mut self, id: ItemId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(iname: &str, value: &str) -> ParsedItem {
        let name = iname.rsplit('.').next().unwrap_or(iname);
        ParsedItem {
            item: WatchItem {
                value: value.into(),
                ..WatchItem::new(iname, name)
            },
            children: Vec::new(),
        }
    }

    fn names(tree: &WatchTree, id: ItemId) -> Vec<String> {
        tree.children(id)
            .iter()
            .map(|child| tree.get(*child).unwrap().name.clone())
            .collect()
    }

    #[test]
    fn fixed_roots() {
        let tree = WatchTree::new();
        let titles: Vec<_> = tree
            .children(tree.root())
            .iter()
            .map(|id| tree.get(*id).unwrap().name.clone())
            .collect();
        assert_eq!(titles, ["Locals", "Inspector", "Expressions", "Return Value", "Tooltip"]);
        assert_eq!(tree.find("watch"), Some(tree.category_root(RootKind::Watchers)));
        assert_eq!(tree.level(tree.category_root(RootKind::Locals)), 1);
    }

    #[test]
    fn replace_keeps_row_and_handle() {
        let mut tree = WatchTree::new();
        let a = tree.insert(leaf("local.a", "1")).id().unwrap();
        tree.insert(leaf("local.b", "2"));
        let again = tree.insert(leaf("local.a", "3"));
        assert_eq!(again, Insertion::Replaced(a));
        assert_eq!(tree.get(a).unwrap().value, "3");
        assert_eq!(tree.row(a), Some(0));
        assert_eq!(names(&tree, tree.category_root(RootKind::Locals)), ["a", "b"]);
    }

    #[test]
    fn missing_parent_is_skipped() {
        let mut tree = WatchTree::new();
        assert_eq!(tree.insert(leaf("local.nope.x", "1")), Insertion::MissingParent);
        assert_eq!(tree.insert(leaf("orphan", "1")), Insertion::MissingParent);
        assert!(tree.find("local.nope.x").is_none());
    }

    #[test]
    fn stale_handles_do_not_alias() {
        let mut tree = WatchTree::new();
        let a = tree.insert(leaf("local.a", "1")).id().unwrap();
        assert!(tree.remove(a));
        let b = tree.insert(leaf("local.b", "2")).id().unwrap();
        assert!(tree.get(a).is_none());
        assert_eq!(tree.get(b).unwrap().value, "2");
        assert!(tree.find("local.a").is_none());
    }

    #[test]
    fn sweep_removes_only_unrefreshed() {
        let mut tree = WatchTree::new();
        let mut s = leaf("local.s", "");
        s.children.push(leaf("local.s.f", "1"));
        tree.insert(s);
        tree.insert(leaf("local.gone", "2"));
        tree.insert(leaf("local.kept", "3"));

        let locals = tree.category_root(RootKind::Locals);
        tree.mark_outdated(locals);
        tree.mark_outdated(locals);
        tree.insert(leaf("local.kept", "4"));
        assert_eq!(tree.sweep_outdated(), 2);

        assert!(tree.find("local.s").is_none());
        assert!(tree.find("local.s.f").is_none());
        assert!(tree.find("local.gone").is_none());
        assert_eq!(tree.get(tree.find("local.kept").unwrap()).unwrap().value, "4");
        assert!(tree.contains(locals));
    }

    #[test]
    fn roots_survive_removal() {
        let mut tree = WatchTree::new();
        tree.insert(leaf("watch.0", "1"));
        let watch = tree.category_root(RootKind::Watchers);
        assert!(!tree.remove(watch));
        assert!(tree.contains(watch));
        assert_eq!(tree.child_count(watch), 0);
    }

    #[test]
    fn later_duplicate_sibling_wins() {
        let mut tree = WatchTree::new();
        let mut s = leaf("local.s", "");
        s.children.push(leaf("local.s.f", "1"));
        s.children.push(leaf("local.s.g", "2"));
        s.children.push(leaf("local.s.f", "3"));
        let s = tree.insert(s).id().unwrap();

        assert_eq!(names(&tree, s), ["g", "f"]);
        let f = tree.find("local.s.f").unwrap();
        assert_eq!(tree.get(f).unwrap().value, "3");
        assert_eq!(tree.parent(f), Some(s));
    }

    #[test]
    fn child_named_like_a_root_is_dropped() {
        let mut tree = WatchTree::new();
        tree.insert(leaf("local.x", "1"));
        let mut a = leaf("local.a", "");
        a.children.push(leaf("local", "l"));
        a.children.push(leaf("local.a.y", "2"));
        let a = tree.insert(a).id().unwrap();

        let locals = tree.category_root(RootKind::Locals);
        assert_eq!(tree.find("local"), Some(locals));
        assert_eq!(names(&tree, locals), ["x", "a"]);
        assert_eq!(names(&tree, a), ["y"]);

        tree.insert(leaf("local.z", "3"));
        assert_eq!(tree.parent(tree.find("local.z").unwrap()), Some(locals));
    }

    #[test]
    fn child_repeating_an_ancestor_is_dropped() {
        let mut tree = WatchTree::new();
        let mut a = leaf("local.a", "1");
        let mut b = leaf("local.a.b", "2");
        b.children.push(leaf("local.a", "bogus"));
        a.children.push(b);
        a.children.push(leaf("local.a", "bogus"));
        let a = tree.insert(a).id().unwrap();

        let locals = tree.category_root(RootKind::Locals);
        assert_eq!(tree.children(locals), [a]);
        assert_eq!(tree.find("local.a"), Some(a));
        assert_eq!(tree.get(a).unwrap().value, "1");
        let b = tree.find("local.a.b").unwrap();
        assert_eq!(tree.parent(b), Some(a));
        assert_eq!(tree.child_count(b), 0);
        assert_eq!(tree.items().count(), 7);
    }

    #[test]
    fn top_level_insert_conflicting_with_ancestor() {
        let mut tree = WatchTree::new();
        let mut a = leaf("local.a", "");
        a.children.push(leaf("local.a.b", ""));
        tree.insert(a);
        let mut c = leaf("local.a.b.c", "");
        c.children.push(leaf("local.a.b", "x"));
        let c = tree.insert(c).id().unwrap();
        assert_eq!(tree.child_count(c), 0);
        assert_eq!(tree.get(tree.find("local.a.b").unwrap()).unwrap().value, "");
    }

    #[test]
    fn sorting_is_by_name() {
        let mut tree = WatchTree::new();
        for name in ["c", "a", "b"] {
            tree.insert(leaf(&format!("local.{name}"), ""));
        }
        let locals = tree.category_root(RootKind::Locals);
        tree.sort_children_by_name(locals);
        assert_eq!(names(&tree, locals), ["a", "b", "c"]);
    }
}
