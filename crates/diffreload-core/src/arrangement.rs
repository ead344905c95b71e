#![forbid(unsafe_code)]

//! Ordered, sectioned lists of row identifiers.
//!
//! An [`Arrangement`] describes the desired state of a list: sections in
//! order, each holding items in order. It can also carry *reload marks*:
//! items whose rows must be re-bound even though they neither move nor
//! change identity.
//!
//! # Invariants
//!
//! 1. Every section identifier appears at most once.
//! 2. Every item identifier appears at most once across all sections.
//! 3. Reload marks only name items present in the arrangement, each at most
//!    once. Deleting an item drops its mark.
//!
//! Every mutating operation validates its input first and leaves the
//! arrangement untouched when it returns an error.

use std::hash::Hash;

use ahash::{AHashMap, AHashSet};

use crate::error::ArrangementError;

type Result<T> = std::result::Result<T, ArrangementError>;

#[derive(Debug, Clone, PartialEq)]
struct Section<S, I> {
    id: S,
    items: Vec<I>,
}

/// Sectioned item identifiers plus optional reload marks.
#[derive(Debug, Clone)]
pub struct Arrangement<S, I> {
    sections: Vec<Section<S, I>>,
    /// Item -> index into `sections`.
    item_sections: AHashMap<I, usize>,
    reloaded: Vec<I>,
}

impl<S, I> Default for Arrangement<S, I> {
    fn default() -> Self {
        Self {
            sections: Vec::new(),
            item_sections: AHashMap::new(),
            reloaded: Vec::new(),
        }
    }
}

impl<S: PartialEq, I: PartialEq> PartialEq for Arrangement<S, I> {
    fn eq(&self, other: &Self) -> bool {
        self.sections == other.sections && self.reloaded == other.reloaded
    }
}

impl<S, I> Arrangement<S, I>
where
    S: PartialEq + Clone,
    I: Eq + Hash + Clone,
{
    /// Create an empty arrangement.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an arrangement from `(section, items)` pairs.
    pub fn from_sections(sections: impl IntoIterator<Item = (S, Vec<I>)>) -> Result<Self> {
        let mut arrangement = Self::new();
        for (section, items) in sections {
            arrangement.append_sections([section.clone()])?;
            arrangement.append_items(items, Some(&section))?;
        }
        Ok(arrangement)
    }

    // ── Queries ──────────────────────────────────────────────────────────

    #[must_use]
    pub fn number_of_sections(&self) -> usize {
        self.sections.len()
    }

    #[must_use]
    pub fn number_of_items(&self) -> usize {
        self.item_sections.len()
    }

    /// Section identifiers in order.
    pub fn section_identifiers(&self) -> impl Iterator<Item = &S> {
        self.sections.iter().map(|s| &s.id)
    }

    /// All item identifiers, section by section, in order.
    pub fn item_identifiers(&self) -> impl Iterator<Item = &I> {
        self.sections.iter().flat_map(|s| s.items.iter())
    }

    /// Items of one section, or `None` if the section is unknown.
    #[must_use]
    pub fn items_in_section(&self, section: &S) -> Option<&[I]> {
        self.section_index(section)
            .map(|idx| self.sections[idx].items.as_slice())
    }

    #[must_use]
    pub fn section_of_item(&self, item: &I) -> Option<&S> {
        self.item_sections
            .get(item)
            .map(|&idx| &self.sections[idx].id)
    }

    /// Position of `item` in the flattened item order.
    #[must_use]
    pub fn index_of_item(&self, item: &I) -> Option<usize> {
        let section_idx = *self.item_sections.get(item)?;
        let before: usize = self.sections[..section_idx]
            .iter()
            .map(|s| s.items.len())
            .sum();
        let within = self.sections[section_idx]
            .items
            .iter()
            .position(|i| i == item)?;
        Some(before + within)
    }

    #[must_use]
    pub fn contains_item(&self, item: &I) -> bool {
        self.item_sections.contains_key(item)
    }

    #[must_use]
    pub fn contains_section(&self, section: &S) -> bool {
        self.section_index(section).is_some()
    }

    // ── Sections ─────────────────────────────────────────────────────────

    /// Append sections at the end.
    pub fn append_sections(&mut self, sections: impl IntoIterator<Item = S>) -> Result<()> {
        let sections: Vec<S> = sections.into_iter().collect();
        for (i, section) in sections.iter().enumerate() {
            if self.contains_section(section) || sections[..i].contains(section) {
                return Err(ArrangementError::DuplicateSection);
            }
        }
        self.sections.extend(sections.into_iter().map(|id| Section {
            id,
            items: Vec::new(),
        }));
        Ok(())
    }

    /// Delete sections together with their items.
    pub fn delete_sections(&mut self, sections: &[S]) -> Result<()> {
        if sections.iter().any(|s| !self.contains_section(s)) {
            return Err(ArrangementError::UnknownSection);
        }
        let removed: Vec<I> = self
            .sections
            .iter()
            .filter(|s| sections.contains(&s.id))
            .flat_map(|s| s.items.iter().cloned())
            .collect();
        self.sections.retain(|s| !sections.contains(&s.id));
        self.forget_items(&removed);
        self.reindex();
        Ok(())
    }

    /// Move `section` so it sits directly before `anchor`.
    pub fn move_section_before(&mut self, section: &S, anchor: &S) -> Result<()> {
        self.move_section(section, anchor, 0)
    }

    /// Move `section` so it sits directly after `anchor`.
    pub fn move_section_after(&mut self, section: &S, anchor: &S) -> Result<()> {
        self.move_section(section, anchor, 1)
    }

    fn move_section(&mut self, section: &S, anchor: &S, offset: usize) -> Result<()> {
        if section == anchor {
            return Err(ArrangementError::SelfAnchor);
        }
        let from = self
            .section_index(section)
            .ok_or(ArrangementError::UnknownSection)?;
        if !self.contains_section(anchor) {
            return Err(ArrangementError::UnknownSection);
        }
        let moved = self.sections.remove(from);
        let to = self
            .section_index(anchor)
            .ok_or(ArrangementError::UnknownSection)?
            + offset;
        self.sections.insert(to, moved);
        self.reindex();
        Ok(())
    }

    // ── Items ────────────────────────────────────────────────────────────

    /// Append items to `section`, or to the last section when `None`.
    pub fn append_items(
        &mut self,
        items: impl IntoIterator<Item = I>,
        section: Option<&S>,
    ) -> Result<()> {
        let section_idx = match section {
            Some(section) => self
                .section_index(section)
                .ok_or(ArrangementError::UnknownSection)?,
            None => self
                .sections
                .len()
                .checked_sub(1)
                .ok_or(ArrangementError::NoSections)?,
        };
        let items = self.validate_new_items(items)?;
        for item in &items {
            self.item_sections.insert(item.clone(), section_idx);
        }
        self.sections[section_idx].items.extend(items);
        Ok(())
    }

    /// Insert items directly before `anchor`, in the anchor's section.
    pub fn insert_items_before(
        &mut self,
        items: impl IntoIterator<Item = I>,
        anchor: &I,
    ) -> Result<()> {
        self.insert_items(items, anchor, 0)
    }

    /// Insert items directly after `anchor`, in the anchor's section.
    pub fn insert_items_after(
        &mut self,
        items: impl IntoIterator<Item = I>,
        anchor: &I,
    ) -> Result<()> {
        self.insert_items(items, anchor, 1)
    }

    fn insert_items(
        &mut self,
        items: impl IntoIterator<Item = I>,
        anchor: &I,
        offset: usize,
    ) -> Result<()> {
        let (section_idx, anchor_pos) = self
            .locate(anchor)
            .ok_or(ArrangementError::UnknownItem)?;
        let items = self.validate_new_items(items)?;
        for item in &items {
            self.item_sections.insert(item.clone(), section_idx);
        }
        let at = anchor_pos + offset;
        self.sections[section_idx].items.splice(at..at, items);
        Ok(())
    }

    /// Delete items; fails without changes if any item is unknown.
    pub fn delete_items(&mut self, items: &[I]) -> Result<()> {
        if items.iter().any(|i| !self.contains_item(i)) {
            return Err(ArrangementError::UnknownItem);
        }
        let doomed: AHashSet<&I> = items.iter().collect();
        for section in &mut self.sections {
            section.items.retain(|i| !doomed.contains(i));
        }
        self.forget_items(items);
        Ok(())
    }

    /// Move `item` directly before `anchor` (possibly into another section).
    pub fn move_item_before(&mut self, item: &I, anchor: &I) -> Result<()> {
        self.move_item(item, anchor, 0)
    }

    /// Move `item` directly after `anchor` (possibly into another section).
    pub fn move_item_after(&mut self, item: &I, anchor: &I) -> Result<()> {
        self.move_item(item, anchor, 1)
    }

    fn move_item(&mut self, item: &I, anchor: &I, offset: usize) -> Result<()> {
        if item == anchor {
            return Err(ArrangementError::SelfAnchor);
        }
        let (from_section, from_pos) = self.locate(item).ok_or(ArrangementError::UnknownItem)?;
        if !self.contains_item(anchor) {
            return Err(ArrangementError::UnknownItem);
        }
        let moved = self.sections[from_section].items.remove(from_pos);
        let (to_section, anchor_pos) = self.locate(anchor).ok_or(ArrangementError::UnknownItem)?;
        self.sections[to_section]
            .items
            .insert(anchor_pos + offset, moved);
        self.item_sections.insert(item.clone(), to_section);
        Ok(())
    }

    // ── Reload marks ─────────────────────────────────────────────────────

    /// Mark items whose rows must be re-bound on the next apply.
    pub fn reload_items(&mut self, items: impl IntoIterator<Item = I>) -> Result<()> {
        let items: Vec<I> = items.into_iter().collect();
        if items.iter().any(|i| !self.contains_item(i)) {
            return Err(ArrangementError::UnknownItem);
        }
        for item in items {
            if !self.reloaded.contains(&item) {
                self.reloaded.push(item);
            }
        }
        Ok(())
    }

    /// Items marked for reload, in marking order.
    #[must_use]
    pub fn reloaded_items(&self) -> &[I] {
        &self.reloaded
    }

    #[must_use]
    pub fn has_reload_marks(&self) -> bool {
        !self.reloaded.is_empty()
    }

    pub fn clear_reload_marks(&mut self) {
        self.reloaded.clear();
    }

    /// Same arrangement without reload marks.
    #[must_use]
    pub fn without_reload_marks(mut self) -> Self {
        self.reloaded.clear();
        self
    }

    // ── Internals ────────────────────────────────────────────────────────

    fn section_index(&self, section: &S) -> Option<usize> {
        self.sections.iter().position(|s| &s.id == section)
    }

    fn locate(&self, item: &I) -> Option<(usize, usize)> {
        let section_idx = *self.item_sections.get(item)?;
        let pos = self.sections[section_idx]
            .items
            .iter()
            .position(|i| i == item)?;
        Some((section_idx, pos))
    }

    fn validate_new_items(&self, items: impl IntoIterator<Item = I>) -> Result<Vec<I>> {
        let items: Vec<I> = items.into_iter().collect();
        let mut batch: AHashSet<&I> = AHashSet::with_capacity(items.len());
        for item in &items {
            if self.contains_item(item) || !batch.insert(item) {
                return Err(ArrangementError::DuplicateItem);
            }
        }
        Ok(items)
    }

    fn forget_items(&mut self, items: &[I]) {
        for item in items {
            self.item_sections.remove(item);
        }
        self.reloaded.retain(|i| !items.contains(i));
    }

    fn reindex(&mut self) {
        self.item_sections.clear();
        for (idx, section) in self.sections.iter().enumerate() {
            for item in &section.items {
                self.item_sections.insert(item.clone(), idx);
            }
        }
    }
}
