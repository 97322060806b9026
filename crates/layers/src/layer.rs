use registry::MarkerSet;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct LayerId(pub u64);

pub trait Layer {
    fn id(&self) -> LayerId;

    /// Markers currently drawn by this layer.
    fn members(&self) -> &MarkerSet;
}
