//! Sub-panel identifiers, repaint masks and sizes.

/// The four sub-panels of the trim monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelId {
    TopEdge,
    BottomEdge,
    LeftHalf,
    RightHalf,
}

impl PanelId {
    pub const ALL: [PanelId; 4] = [
        PanelId::TopEdge,
        PanelId::BottomEdge,
        PanelId::LeftHalf,
        PanelId::RightHalf,
    ];

    const fn bit(self) -> u8 {
        match self {
            PanelId::TopEdge => 1,
            PanelId::BottomEdge => 1 << 1,
            PanelId::LeftHalf => 1 << 2,
            PanelId::RightHalf => 1 << 3,
        }
    }
}

/// Set of panels awaiting repaint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PanelMask(u8);

impl PanelMask {
    pub const NONE: PanelMask = PanelMask(0);
    pub const ALL: PanelMask = PanelMask(0b1111);
    pub const BOTTOM: PanelMask = PanelMask(PanelId::BottomEdge.bit());
    pub const HALVES: PanelMask = PanelMask(PanelId::LeftHalf.bit() | PanelId::RightHalf.bit());

    pub fn contains(self, panel: PanelId) -> bool {
        self.0 & panel.bit() != 0
    }

    pub fn insert(&mut self, other: PanelMask) {
        self.0 |= other.0;
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn panels(self) -> impl Iterator<Item = PanelId> {
        PanelId::ALL.into_iter().filter(move |p| self.contains(*p))
    }
}

impl From<PanelId> for PanelMask {
    fn from(panel: PanelId) -> Self {
        PanelMask(panel.bit())
    }
}

/// Integer pixel size of a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PanelSize {
    pub width: u32,
    pub height: u32,
}

impl PanelSize {
    /// Collapsed panel; toolkits can't allocate zero.
    pub const MINIMAL: PanelSize = PanelSize { width: 1, height: 1 };

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_minimal(self) -> bool {
        self.width <= 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_membership() {
        let mut mask = PanelMask::NONE;
        assert!(mask.is_empty());
        mask.insert(PanelMask::BOTTOM);
        assert!(mask.contains(PanelId::BottomEdge));
        assert!(!mask.contains(PanelId::LeftHalf));
        mask.insert(PanelMask::HALVES);
        let panels: Vec<_> = mask.panels().collect();
        assert_eq!(panels, vec![PanelId::BottomEdge, PanelId::LeftHalf, PanelId::RightHalf]);
        mask.insert(PanelId::TopEdge.into());
        assert_eq!(mask, PanelMask::ALL);
    }
}
