use common::*;
use std::collections::BTreeMap;

use crate::palette::PaletteRecord;

pub type RegionLabel = u32;

/// First label handed out; 0..2 are reserved for occupancy codes
pub const STARTING_LABEL: RegionLabel = 3;

/// Shade-loving species take even labels
pub fn is_shade_loving_label(label: RegionLabel) -> bool {
    label % 2 == 0
}

/// Border-loving species take labels divisible by three
pub fn is_border_loving_label(label: RegionLabel) -> bool {
    label % 3 == 0
}

/// The four shrub habits, in label-assignment order
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ShrubCategory {
    BorderShadeHating,
    NotBorderShadeLoving,
    NotBorderShadeHating,
    BorderShadeLoving,
}

impl ShrubCategory {
    pub const ALL: [ShrubCategory; 4] = [
        ShrubCategory::BorderShadeHating,
        ShrubCategory::NotBorderShadeLoving,
        ShrubCategory::NotBorderShadeHating,
        ShrubCategory::BorderShadeLoving,
    ];

    pub fn of(record: &PaletteRecord) -> Self {
        match (record.is_border_friendly(), record.is_shade_loving()) {
            (true, false) => ShrubCategory::BorderShadeHating,
            (true, true) => ShrubCategory::BorderShadeLoving,
            (false, true) => ShrubCategory::NotBorderShadeLoving,
            (false, false) => ShrubCategory::NotBorderShadeHating,
        }
    }

    /// Whether the label's parity encodes this category
    pub fn admits(self, label: RegionLabel) -> bool {
        let shade = is_shade_loving_label(label);
        let border = is_border_loving_label(label);
        match self {
            ShrubCategory::BorderShadeHating => !shade && border,
            ShrubCategory::NotBorderShadeLoving => shade && !border,
            ShrubCategory::NotBorderShadeHating => !shade && !border,
            ShrubCategory::BorderShadeLoving => shade && border,
        }
    }

    fn index(self) -> usize {
        match self {
            ShrubCategory::BorderShadeHating => 0,
            ShrubCategory::NotBorderShadeLoving => 1,
            ShrubCategory::NotBorderShadeHating => 2,
            ShrubCategory::BorderShadeLoving => 3,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SeedEntry {
    pub label: RegionLabel,
    /// Index into the shrub half of the palette
    pub shrub: usize,
}

/// The fixed bijection between region labels and shrub species, ordered
/// by category then palette order
#[derive(Clone, Debug)]
pub struct SeedMapping {
    entries: Vec<SeedEntry>,
}

impl SeedMapping {
    /// Walk the integers from 3 upward, handing each to the one category
    /// whose parity pattern it matches, until every shrub has a label
    pub fn assign(shrubs: &[PaletteRecord]) -> Self {
        let mut members: [Vec<usize>; 4] = Default::default();
        for (index, record) in shrubs.iter().enumerate() {
            members[ShrubCategory::of(record).index()].push(index);
        }

        let mut labels: [Vec<RegionLabel>; 4] = Default::default();
        let mut label = STARTING_LABEL;
        while ShrubCategory::ALL
            .iter()
            .any(|c| labels[c.index()].len() < members[c.index()].len())
        {
            for category in &ShrubCategory::ALL {
                let i = category.index();
                if category.admits(label) && labels[i].len() < members[i].len() {
                    labels[i].push(label);
                    break;
                }
            }
            label += 1;
        }

        let mut entries = Vec::with_capacity(shrubs.len());
        for category in &ShrubCategory::ALL {
            let i = category.index();
            for (&label, &shrub) in labels[i].iter().zip(members[i].iter()) {
                entries.push(SeedEntry { label, shrub });
            }
        }

        debug!(
            "assigned region labels";
            "species" => shrubs.len(),
            "labels" => ?entries.iter().map(|e| e.label).collect::<Vec<_>>(),
        );

        SeedMapping { entries }
    }

    pub fn entries(&self) -> &[SeedEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Shrub palette index for a label, if the label is mapped
    pub fn species_for(&self, label: RegionLabel) -> Option<usize> {
        self.entries
            .iter()
            .find(|entry| entry.label == label)
            .map(|entry| entry.shrub)
    }
}

/// The first ~80% of shrub placements anchor influence radiation, cycling
/// through the mapped labels in order. Every label gets a (possibly empty)
/// starter list
pub fn choose_starters(
    shrub_positions: &[grid::CoordType],
    mapping: &SeedMapping,
    fraction: f64,
) -> BTreeMap<RegionLabel, Vec<grid::CoordType>> {
    let mut starters: BTreeMap<RegionLabel, Vec<grid::CoordType>> = mapping
        .entries()
        .iter()
        .map(|entry| (entry.label, Vec::new()))
        .collect();

    if mapping.is_empty() {
        return starters;
    }

    let count = ((shrub_positions.len() as f64 * fraction).ceil() as usize)
        .max(1)
        .min(shrub_positions.len());

    for (i, &pos) in shrub_positions[..count].iter().enumerate() {
        let entry = &mapping.entries()[i % mapping.entries().len()];
        starters
            .get_mut(&entry.label)
            .expect("every mapped label was seeded above")
            .push(pos);
    }

    starters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::tests::record;

    #[test]
    fn labels_encode_category_in_parity() {
        let shrubs = vec![
            // border, shade hating -> odd multiple of 3
            record(1, "bsh", "Shrub", "Full Sun", "-", 0.0),
            // not border, shade loving -> even, not multiple of 3
            record(2, "nbsl", "Shrub", "Semi Shade", "Toxic", 0.0),
            // not border, shade hating -> odd, not multiple of 3
            record(3, "nbsh", "Shrub", "Full Sun", "Toxic", 0.0),
            // border, shade loving -> multiple of 6
            record(4, "bsl", "Shrub", "Full Shade", "-", 0.0),
            record(5, "bsh2", "Shrub", "Full Sun", "-", 0.0),
        ];

        let mapping = SeedMapping::assign(&shrubs);
        assert_eq!(mapping.entries().len(), 5);

        for entry in mapping.entries() {
            let record = &shrubs[entry.shrub];
            assert_eq!(
                is_shade_loving_label(entry.label),
                record.is_shade_loving(),
                "label {} breaks the shade encoding",
                entry.label
            );
            assert_eq!(
                is_border_loving_label(entry.label),
                record.is_border_friendly(),
                "label {} breaks the border encoding",
                entry.label
            );
        }

        // lowest admissible labels, never reused
        let labels: Vec<_> = mapping.entries().iter().map(|e| e.label).collect();
        assert_eq!(labels.iter().unique().count(), labels.len());
        let bsh_labels: Vec<_> = mapping
            .entries()
            .iter()
            .filter(|e| shrubs[e.shrub].scientific_name.starts_with("bsh"))
            .map(|e| e.label)
            .collect();
        assert_eq!(bsh_labels, vec![3, 9]);
    }

    #[test]
    fn starters_cycle_through_labels() {
        let shrubs = vec![
            record(1, "a", "Shrub", "Full Sun", "-", 0.0),
            record(2, "b", "Shrub", "Semi Shade", "Toxic", 0.0),
        ];
        let mapping = SeedMapping::assign(&shrubs);

        let positions: Vec<[usize; 2]> = (0..10).map(|i| [i, i]).collect();
        let starters = choose_starters(&positions, &mapping, 0.8);

        // ceil(0.8 * 10) = 8 starters split across 2 labels
        let total: usize = starters.values().map(Vec::len).sum();
        assert_eq!(total, 8);
        for list in starters.values() {
            assert_eq!(list.len(), 4);
        }
    }

    #[test]
    fn at_least_one_starter() {
        let shrubs = vec![record(1, "a", "Shrub", "Full Sun", "-", 0.0)];
        let mapping = SeedMapping::assign(&shrubs);

        let starters = choose_starters(&[[3, 3]], &mapping, 0.8);
        assert_eq!(starters.values().map(Vec::len).sum::<usize>(), 1);
    }
}
