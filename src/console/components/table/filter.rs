use tui_input::Input;

#[derive(Default)]
pub enum Filter {
    #[default]
    Disabled,
    Input(Input),
    Value(String),
}

impl Filter {
    pub fn is_input(&self) -> bool {
        matches!(self, Filter::Input(_))
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Filter::Input(_) | Filter::Value(_))
    }

    pub fn search(&self) -> Option<&str> {
        match self {
            Filter::Disabled => None,
            Filter::Input(input) => Some(input.value()),
            Filter::Value(value) => Some(value),
        }
    }
}
