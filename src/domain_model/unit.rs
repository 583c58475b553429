use serde::Deserialize;

#[derive(Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Deserialize)]
pub struct PageSize(pub u16);

impl Default for PageSize {
    fn default() -> Self {
        PageSize(50)
    }
}
