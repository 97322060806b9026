use registry::MarkerSet;

use crate::layer::{Layer, LayerId};

/// Destination for markers rendered one by one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndividualLayer {
    id: LayerId,
    members: MarkerSet,
}

impl IndividualLayer {
    pub fn new(id: u64) -> Self {
        Self {
            id: LayerId(id),
            members: MarkerSet::new(),
        }
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }

    pub fn add(&mut self, markers: &MarkerSet) {
        self.members.union_in_place(markers);
    }
}

impl Layer for IndividualLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn members(&self) -> &MarkerSet {
        &self.members
    }
}
