#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Review,
    Complete,
    Exited,
}

impl Screen {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Review => "review",
            Self::Complete => "complete",
            Self::Exited => "exited",
        }
    }
}

/// Which editable field receives typed characters on the review screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Score,
    Response,
    RowNumber,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Self::Score => Self::Response,
            Self::Response | Self::RowNumber => Self::Score,
        }
    }
}
