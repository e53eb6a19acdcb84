use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, Screen};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    None,
    Quit,
    /// Validate, read, and classify the file named in the path input
    ClassifyPath,
    /// Run `service.nearby_centers`(...) around the known position
    LoadCenters,
}

pub(crate) fn handle_key_event(key: KeyEvent, app: &mut App) -> Action {
    use KeyCode::{Backspace, Char, Down, Enter, Esc, Tab, Up};

    // Global shortcuts
    if key.code == Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }
    if key.code == Tab {
        app.screen = app.screen.next();
        return Action::None;
    }

    let mut action = Action::None;

    match app.screen {
        // Every printable key edits the path here, so quitting needs Esc.
        Screen::Upload => match key.code {
            Char(character) => {
                if !key.modifiers.contains(KeyModifiers::CONTROL)
                    && !key.modifiers.contains(KeyModifiers::ALT)
                {
                    app.path_input.push(character);
                }
            }
            Backspace => {
                app.path_input.pop();
            }
            Enter => {
                if !app.upload.is_busy() {
                    action = Action::ClassifyPath;
                }
            }
            Up => app.heavier(),
            Down => app.lighter(),
            Esc => action = Action::Quit,
            _ => {}
        },

        Screen::Centers => match key.code {
            Up | Char('k') => {
                if app.center_list_index > 0 {
                    app.center_list_index -= 1;
                }
            }
            Down | Char('j') => {
                if app.center_list_index + 1 < app.centers().len() {
                    app.center_list_index += 1;
                }
            }
            Char('r') => action = Action::LoadCenters,
            Char('q') | Esc => action = Action::Quit,
            _ => {}
        },

        Screen::Prices => {
            if matches!(key.code, Char('q') | Esc) {
                action = Action::Quit;
            }
        }
    }
    action
}
