//! The fixed service menu offered after `/start`.

/// One selectable service: what the user sees and what the button carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuOption {
    pub label: String,
    pub id: String,
}

impl MenuOption {
    pub fn new(label: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            id: id.into(),
        }
    }
}

/// Ordered list of options. Display order is declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu {
    options: Vec<MenuOption>,
}

impl Menu {
    pub fn new(options: Vec<MenuOption>) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &[MenuOption] {
        &self.options
    }

    /// Label for a button id. Unknown ids fall back to the raw id.
    pub fn label_for<'a>(&'a self, id: &'a str) -> &'a str {
        self.options
            .iter()
            .find(|o| o.id == id)
            .map_or(id, |o| o.label.as_str())
    }
}

impl Default for Menu {
    fn default() -> Self {
        Self::new(vec![
            MenuOption::new("Консультация", "opt_consult"),
            MenuOption::new("40 дней сопровождения", "opt_40days"),
            MenuOption::new("Сопровождение беременности", "opt_pregnancy"),
            MenuOption::new("Индивидуальный занятия для женщин", "opt_individual"),
        ])
    }
}
