pub const EMPTY_TEXT: &str = ".";
pub const VALIDATED_TEXT: &str = "X";
pub const PENDING_TEXT: &str = "...";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CellState {
    #[default]
    Empty,
    Validated,
    Pending,
}

/// CSS markers carried by a rendered cell next to its `menu` class.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Marker {
    Validated,
    Updating,
    Clicked,
}

impl Marker {
    pub fn class(self) -> &'static str {
        match self {
            Marker::Validated => "validated",
            Marker::Updating => "updating",
            Marker::Clicked => "clicked",
        }
    }
}

/// State of one grid cell. Display text and markers are derived from the
/// tagged state plus the transient menu highlight.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CellView {
    state: CellState,
    highlighted: bool,
}

impl CellView {
    pub fn state(&self) -> CellState {
        self.state
    }

    pub fn text(&self) -> &'static str {
        match self.state {
            CellState::Empty => EMPTY_TEXT,
            CellState::Validated => VALIDATED_TEXT,
            CellState::Pending => PENDING_TEXT,
        }
    }

    pub fn markers(&self) -> Vec<Marker> {
        let mut markers = Vec::new();
        // An open menu hides the validated marker until it closes.
        if self.state == CellState::Validated && !self.highlighted {
            markers.push(Marker::Validated);
        }
        if self.state == CellState::Pending {
            markers.push(Marker::Updating);
        }
        if self.highlighted {
            markers.push(Marker::Clicked);
        }
        markers
    }

    pub fn has_marker(&self, marker: Marker) -> bool {
        self.markers().contains(&marker)
    }

    /// Value of the `class` attribute: `menu` followed by the active markers.
    pub fn class_attr(&self) -> String {
        let mut class = String::from("menu");
        for marker in self.markers() {
            class.push(' ');
            class.push_str(marker.class());
        }
        class
    }

    pub fn validate(&mut self) {
        self.state = CellState::Validated;
        self.highlighted = false;
    }

    pub fn clear(&mut self) {
        self.state = CellState::Empty;
        self.highlighted = false;
    }

    pub fn mark_pending(&mut self) {
        self.state = CellState::Pending;
        self.highlighted = false;
    }

    pub fn highlight(&mut self) {
        self.highlighted = true;
    }

    pub fn unhighlight(&mut self) {
        self.highlighted = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_cell_is_empty_dot() {
        let cell = CellView::default();
        assert_eq!(cell.state(), CellState::Empty);
        assert_eq!(cell.text(), ".");
        assert!(cell.markers().is_empty());
        assert_eq!(cell.class_attr(), "menu");
    }

    #[test]
    fn test_validate_sets_x_and_marker() {
        let mut cell = CellView::default();
        cell.validate();
        assert_eq!(cell.text(), "X");
        assert_eq!(cell.markers(), vec![Marker::Validated]);
        assert_eq!(cell.class_attr(), "menu validated");
    }

    #[test]
    fn test_pending_drops_validated_marker() {
        let mut cell = CellView::default();
        cell.validate();
        cell.mark_pending();
        assert_eq!(cell.text(), "...");
        assert!(cell.has_marker(Marker::Updating));
        assert!(!cell.has_marker(Marker::Validated));
    }

    #[test]
    fn test_highlight_hides_validated_then_restores() {
        let mut cell = CellView::default();
        cell.validate();
        cell.highlight();
        assert_eq!(cell.markers(), vec![Marker::Clicked]);
        cell.unhighlight();
        assert_eq!(cell.markers(), vec![Marker::Validated]);
    }

    #[test]
    fn test_highlight_keeps_updating_marker() {
        let mut cell = CellView::default();
        cell.mark_pending();
        cell.highlight();
        assert!(cell.has_marker(Marker::Updating));
        assert!(cell.has_marker(Marker::Clicked));
        cell.unhighlight();
        assert_eq!(cell.markers(), vec![Marker::Updating]);
    }

    #[test]
    fn test_transitions_clear_highlight() {
        let mut cell = CellView::default();
        cell.highlight();
        cell.mark_pending();
        assert!(!cell.has_marker(Marker::Clicked));
        cell.highlight();
        cell.validate();
        assert!(!cell.has_marker(Marker::Clicked));
        cell.highlight();
        cell.clear();
        assert!(!cell.has_marker(Marker::Clicked));
        assert_eq!(cell.text(), ".");
    }
}
