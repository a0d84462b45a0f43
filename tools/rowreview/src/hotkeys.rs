use crate::types::Screen;

pub const TAB: char = '\t';
pub const ESC: char = '\u{1b}';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotkeyBinding {
    pub key: char,
    pub ctrl: bool,
    pub action: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyAction {
    Next,
    Previous,
    JumpToRow,
    SaveAndExit,
    Download,
    CycleFocus,
    Quit,
}

pub const REVIEW_BINDINGS: [HotkeyBinding; 6] = [
    HotkeyBinding {
        key: 'n',
        ctrl: true,
        action: "next",
    },
    HotkeyBinding {
        key: 'p',
        ctrl: true,
        action: "previous",
    },
    HotkeyBinding {
        key: 'g',
        ctrl: true,
        action: "go to row",
    },
    HotkeyBinding {
        key: 's',
        ctrl: true,
        action: "save & exit",
    },
    HotkeyBinding {
        key: TAB,
        ctrl: false,
        action: "switch field",
    },
    HotkeyBinding {
        key: ESC,
        ctrl: false,
        action: "quit",
    },
];

pub const COMPLETE_BINDINGS: [HotkeyBinding; 2] = [
    HotkeyBinding {
        key: 'd',
        ctrl: false,
        action: "download results",
    },
    HotkeyBinding {
        key: 'q',
        ctrl: false,
        action: "quit",
    },
];

pub fn bindings_for(screen: Screen) -> &'static [HotkeyBinding] {
    match screen {
        Screen::Review => &REVIEW_BINDINGS,
        Screen::Complete => &COMPLETE_BINDINGS,
        Screen::Exited => &[],
    }
}

pub fn controls_legend(screen: Screen) -> String {
    let parts = bindings_for(screen)
        .iter()
        .map(|binding| format!("{} {}", key_label(binding), binding.action))
        .collect::<Vec<_>>();
    format!("Keys: {}", parts.join("  "))
}

/// Review-screen keys need Ctrl so plain characters stay typeable.
pub fn action_for_key(key: char, ctrl: bool, screen: Screen) -> Option<HotkeyAction> {
    if ctrl && key == 'c' {
        return Some(HotkeyAction::Quit);
    }
    match screen {
        Screen::Review => match (key, ctrl) {
            ('n', true) => Some(HotkeyAction::Next),
            ('p', true) => Some(HotkeyAction::Previous),
            ('g', true) => Some(HotkeyAction::JumpToRow),
            ('s', true) => Some(HotkeyAction::SaveAndExit),
            (TAB, _) => Some(HotkeyAction::CycleFocus),
            (ESC, _) => Some(HotkeyAction::Quit),
            _ => None,
        },
        Screen::Complete => match key {
            'd' => Some(HotkeyAction::Download),
            'q' | ESC => Some(HotkeyAction::Quit),
            _ => None,
        },
        Screen::Exited => None,
    }
}

fn key_label(binding: &HotkeyBinding) -> String {
    match (binding.key, binding.ctrl) {
        (TAB, _) => "Tab".to_string(),
        (ESC, _) => "Esc".to_string(),
        (key, true) => format!("^{}", key.to_ascii_uppercase()),
        (key, false) => key.to_string(),
    }
}
