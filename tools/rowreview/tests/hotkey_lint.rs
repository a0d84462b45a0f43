use rowreview::hotkeys::{
    action_for_key, bindings_for, controls_legend, HotkeyAction, COMPLETE_BINDINGS, ESC,
    REVIEW_BINDINGS, TAB,
};
use rowreview::types::Screen;

#[test]
fn linter_every_advertised_binding_has_behavior() {
    for screen in [Screen::Review, Screen::Complete] {
        for binding in bindings_for(screen) {
            assert!(
                action_for_key(binding.key, binding.ctrl, screen).is_some(),
                "advertised hotkey `{}` on {} screen has no application behavior",
                binding.action,
                screen.as_str()
            );
            assert!(
                controls_legend(screen).contains(binding.action),
                "binding `{}` missing from the {} legend",
                binding.action,
                screen.as_str()
            );
        }
    }
}

#[test]
fn review_bindings_resolve_to_expected_actions() {
    let cases = [
        ('n', true, HotkeyAction::Next),
        ('p', true, HotkeyAction::Previous),
        ('g', true, HotkeyAction::JumpToRow),
        ('s', true, HotkeyAction::SaveAndExit),
        (TAB, false, HotkeyAction::CycleFocus),
        (ESC, false, HotkeyAction::Quit),
        ('c', true, HotkeyAction::Quit),
    ];
    for (key, ctrl, expected) in cases {
        let action = action_for_key(key, ctrl, Screen::Review);
        assert_eq!(action, Some(expected), "key {key:?} (ctrl={ctrl}) should resolve to {expected:?}");
    }
    assert_eq!(REVIEW_BINDINGS.len(), 6);
}

#[test]
fn typing_keys_stay_free_on_the_review_screen() {
    for key in ['a', 'z', '0', '9', ' ', ',', 'd', 'q', 'n'] {
        assert_eq!(action_for_key(key, false, Screen::Review), None, "key {key:?} must stay typeable");
    }
}

#[test]
fn completion_screen_only_downloads_and_quits() {
    assert_eq!(action_for_key('d', false, Screen::Complete), Some(HotkeyAction::Download));
    assert_eq!(action_for_key('q', false, Screen::Complete), Some(HotkeyAction::Quit));
    assert_eq!(action_for_key('n', true, Screen::Complete), None);
    assert_eq!(COMPLETE_BINDINGS.len(), 2);
    assert!(bindings_for(Screen::Exited).is_empty());
    assert_eq!(action_for_key('q', false, Screen::Exited), None);
}
