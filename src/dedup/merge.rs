use super::similarity::{are_duplicates, identity_key};
use crate::event::model::RawEvent;
use crate::text::normalize;
use crate::venues::model::VenueDirectory;
use itertools::Itertools;
use std::cmp::{Ordering, Reverse};
use std::collections::HashMap;
use tracing::{debug, info, instrument};

pub const MAX_MERGED_TAGS: usize = 5;

/// One real-world event: the anchor whose fields win ties plus every candidate folded into it.
#[derive(Debug, Clone)]
pub struct EventGroup {
    pub key: String,
    pub anchor: RawEvent,
    /// Positions of the contributing candidates in the input list.
    pub members: Vec<usize>,
}

impl EventGroup {
    fn new(key: String, position: usize, anchor: RawEvent) -> Self {
        Self {
            key,
            anchor,
            members: vec![position],
        }
    }

    fn absorb(&mut self, position: usize, candidate: &RawEvent) {
        merge_into(&mut self.anchor, candidate);
        self.members.push(position);
    }

    fn absorb_group(&mut self, other: EventGroup) {
        merge_into(&mut self.anchor, &other.anchor);
        self.members.extend(other.members);
    }
}

/// Folds `other` into `anchor`. Anchor values win unless missing; merging twice is a no-op.
pub fn merge_into(anchor: &mut RawEvent, other: &RawEvent) {
    if !anchor.has_coordinates() && other.has_coordinates() {
        anchor.lat = other.lat;
        anchor.lng = other.lng;
    }

    if other.description.chars().count() > anchor.description.chars().count() {
        anchor.description = other.description.clone();
    }

    let mut tags = Vec::with_capacity(MAX_MERGED_TAGS);
    for tag in anchor.tags.iter().chain(other.tags.iter()) {
        if tags.len() == MAX_MERGED_TAGS {
            break;
        }
        if !tags.contains(tag) {
            tags.push(tag.clone());
        }
    }
    anchor.tags = tags;

    if anchor.venue().is_none() && other.venue().is_some() {
        anchor.venue_name = other.venue_name.clone();
    }

    if is_blank(&anchor.address) && !is_blank(&other.address) {
        anchor.address = other.address.clone();
    }

    if is_blank(&anchor.image) && !is_blank(&other.image) {
        anchor.image = other.image.clone();
    }

    if is_blank(&anchor.source_url) && !is_blank(&other.source_url) {
        anchor.source_url = other.source_url.clone();
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |value| value.trim().is_empty())
}

/// Ranks candidates so the most complete ones become anchors: coordinates first, then longer descriptions.
fn quality_rank(event: &RawEvent) -> (Reverse<bool>, Reverse<usize>) {
    (
        Reverse(event.has_coordinates()),
        Reverse(event.description.chars().count()),
    )
}

/// Total order over candidates. Ties on quality fall back to content, so input order never picks the anchor.
fn anchor_order(a: &RawEvent, b: &RawEvent) -> Ordering {
    quality_rank(a)
        .cmp(&quality_rank(b))
        .then_with(|| a.start_at.cmp(&b.start_at))
        .then_with(|| normalize(&a.title).cmp(&normalize(&b.title)))
        .then_with(|| a.venue_or_neighborhood().cmp(b.venue_or_neighborhood()))
        .then_with(|| a.description.cmp(&b.description))
        .then_with(|| a.source_name.cmp(&b.source_name))
        .then_with(|| format!("{:?}", a).cmp(&format!("{:?}", b)))
}

pub struct Deduplicator<'a> {
    directory: &'a VenueDirectory,
}

impl<'a> Deduplicator<'a> {
    pub fn new(directory: &'a VenueDirectory) -> Self {
        Self { directory }
    }

    /// Groups all candidates of a run; every input position ends up in exactly one group.
    #[instrument(skip_all, fields(candidates = candidates.len()))]
    pub fn merge_groups(&self, candidates: Vec<RawEvent>) -> Vec<EventGroup> {
        let mut ranked: Vec<(usize, RawEvent)> = candidates.into_iter().enumerate().collect();
        ranked.sort_by(|(_, a), (_, b)| anchor_order(a, b));

        let mut groups: Vec<EventGroup> = Vec::new();
        let mut groups_by_key: HashMap<String, usize> = HashMap::new();
        let mut exact_merges = 0;
        let mut fuzzy_merges = 0;

        for (position, candidate) in ranked {
            let key = identity_key(&candidate);

            if let Some(&group) = groups_by_key.get(&key) {
                groups[group].absorb(position, &candidate);
                exact_merges += 1;
                continue;
            }

            let matching = groups
                .iter()
                .position(|group| are_duplicates(&group.anchor, &candidate, self.directory));

            match matching {
                Some(group) => {
                    debug!(
                        "Merging '{}' into '{}'",
                        candidate.title, groups[group].anchor.title
                    );
                    groups[group].absorb(position, &candidate);
                    groups_by_key.insert(key, group);
                    fuzzy_merges += 1;
                }
                None => {
                    groups_by_key.insert(key.clone(), groups.len());
                    groups.push(EventGroup::new(key, position, candidate));
                }
            }
        }

        let regrouped = self.regroup(&mut groups);
        groups.sort_by(|a, b| anchor_order(&a.anchor, &b.anchor));

        info!(
            groups = groups.len(),
            exact_merges, fuzzy_merges, regrouped, "Deduplicated candidates"
        );

        groups
    }

    /// Anchors gain venues and neighborhoods while absorbing, so groups formed earlier may now
    /// match each other. Folds such pairs together until no two anchors are duplicates.
    fn regroup(&self, groups: &mut Vec<EventGroup>) -> usize {
        let mut regrouped = 0;

        while let Some((first, second)) = (0..groups.len())
            .tuple_combinations()
            .find(|&(first, second)| self.same_event(&groups[first].anchor, &groups[second].anchor))
        {
            let other = groups.remove(second);
            debug!(
                "Regrouping '{}' into '{}'",
                other.anchor.title, groups[first].anchor.title
            );
            groups[first].absorb_group(other);
            regrouped += 1;
        }

        regrouped
    }

    fn same_event(&self, a: &RawEvent, b: &RawEvent) -> bool {
        identity_key(a) == identity_key(b) || are_duplicates(a, b, self.directory)
    }

    /// One merged record per distinct real event.
    pub fn merge(&self, candidates: Vec<RawEvent>) -> Vec<RawEvent> {
        self.merge_groups(candidates)
            .into_iter()
            .map(|group| group.anchor)
            .collect()
    }
}
