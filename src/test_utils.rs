pub mod test_helpers {
    use crate::event_source::{Event, KeyCode, KeyModifiers, SimulatedEventSource};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    /// Builder for scripted viewer sessions
    #[derive(Default)]
    pub struct TestScenarioBuilder {
        events: Vec<Event>,
    }

    impl TestScenarioBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn press_char(mut self, c: char) -> Self {
            self.events.push(SimulatedEventSource::char_key(c));
            self
        }

        pub fn press_ctrl_char(mut self, c: char) -> Self {
            self.events.push(SimulatedEventSource::ctrl_char_key(c));
            self
        }

        pub fn press_enter(mut self) -> Self {
            self.events
                .push(SimulatedEventSource::key_event(KeyCode::Enter, KeyModifiers::empty()));
            self
        }

        pub fn press_esc(mut self) -> Self {
            self.events
                .push(SimulatedEventSource::key_event(KeyCode::Esc, KeyModifiers::empty()));
            self
        }

        /// Move the field cursor down n times (press 'j' n times)
        pub fn field_down(mut self, times: usize) -> Self {
            for _ in 0..times {
                self.events.push(SimulatedEventSource::char_key('j'));
            }
            self
        }

        /// Move the field cursor up n times (press 'k' n times)
        pub fn field_up(mut self, times: usize) -> Self {
            for _ in 0..times {
                self.events.push(SimulatedEventSource::char_key('k'));
            }
            self
        }

        pub fn next_page(self) -> Self {
            self.press_char('n')
        }

        pub fn prev_page(self) -> Self {
            self.press_char('p')
        }

        /// Mouse wheel over a cell
        pub fn wheel(mut self, down: bool, column: u16, row: u16) -> Self {
            self.events
                .push(SimulatedEventSource::wheel(down, column, row));
            self
        }

        pub fn quit(self) -> Self {
            self.press_char('q')
        }

        pub fn len(&self) -> usize {
            self.events.len()
        }

        pub fn is_empty(&self) -> bool {
            self.events.is_empty()
        }

        pub fn build(self) -> SimulatedEventSource {
            SimulatedEventSource::new(self.events)
        }
    }

    pub fn create_test_terminal(width: u16, height: u16) -> Terminal<TestBackend> {
        let backend = TestBackend::new(width, height);
        Terminal::new(backend).unwrap()
    }

    /// The terminal buffer as text, trailing blanks trimmed
    pub fn capture_terminal_state(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut lines = Vec::new();

        for y in 0..buffer.area.height {
            let mut line = String::new();
            for x in 0..buffer.area.width {
                line.push_str(buffer[(x, y)].symbol());
            }
            lines.push(line.trim_end().to_string());
        }

        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::test_helpers::*;

    #[test]
    fn test_scenario_builder() {
        let scenario = TestScenarioBuilder::new()
            .field_down(2)
            .press_enter()
            .next_page()
            .wheel(true, 3, 3)
            .field_up(1)
            .quit();
        assert_eq!(scenario.len(), 7);
        assert_eq!(scenario.build().remaining(), 7);
    }
}
