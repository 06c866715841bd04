use crate::estimate::evaluator::CostBreakdown;
use crate::estimate::rate::RatedType;
use crate::estimate::total::{grand_total, CategoryTotal, TypeCost};
use crate::model::{ElementId, Project};
use color_eyre::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{DefaultTerminal, Frame};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum View {
    Dashboard,
    TypeDetail,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FocusPanel {
    Categories,
    Types,
}

/// Cost browser over a priced model: categories, their types and each
/// type's recipe breakdown.
pub struct App {
    pub project: Project,
    pub currency: String,
    pub categories: Vec<CategoryTotal>,
    pub total: f64,
    pub breakdowns: HashMap<ElementId, CostBreakdown>,
    pub view: View,
    pub focus_panel: FocusPanel,
    pub selected_category: usize,
    pub selected_type: usize,
    pub detail_scroll_offset: usize,
    pub should_quit: bool,
}

impl App {
    #[must_use]
    pub fn new(project: Project, cost_field: &str, currency: impl Into<String>) -> Self {
        let totals = grand_total(&project, cost_field);
        Self {
            project,
            currency: currency.into(),
            categories: totals.categories,
            total: totals.total,
            breakdowns: HashMap::new(),
            view: View::Dashboard,
            focus_panel: FocusPanel::Categories,
            selected_category: 0,
            selected_type: 0,
            detail_scroll_offset: 0,
            should_quit: false,
        }
    }

    /// Attaches recipe breakdowns so the detail view can show where a
    /// type's cost comes from.
    #[must_use]
    pub fn with_breakdowns(mut self, rated: Vec<RatedType>) -> Self {
        self.breakdowns = rated.into_iter().map(|t| (t.id, t.breakdown)).collect();
        self
    }

    pub fn run(mut self, mut terminal: DefaultTerminal) -> Result<()> {
        while !self.should_quit {
            terminal.draw(|frame| self.draw(frame))?;
            self.handle_events()?;
        }
        Ok(())
    }

    fn draw(&self, frame: &mut Frame) {
        match self.view {
            View::Dashboard => super::dashboard::draw_dashboard(frame, self),
            View::TypeDetail => super::dashboard::draw_type_detail(frame, self),
        }
    }

    fn handle_events(&mut self) -> Result<()> {
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                return Ok(());
            }
            self.handle_key(key.code);
        }
        Ok(())
    }

    pub fn handle_key(&mut self, code: KeyCode) {
        match self.view {
            View::Dashboard => self.handle_dashboard_keys(code),
            View::TypeDetail => self.handle_detail_keys(code),
        }
    }

    fn handle_dashboard_keys(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Up | KeyCode::Char('k') => match self.focus_panel {
                FocusPanel::Categories => self.previous_category(),
                FocusPanel::Types => self.previous_type(),
            },
            KeyCode::Down | KeyCode::Char('j') => match self.focus_panel {
                FocusPanel::Categories => self.next_category(),
                FocusPanel::Types => self.next_type(),
            },
            KeyCode::Left | KeyCode::Char('h') => self.focus_panel = FocusPanel::Categories,
            KeyCode::Right | KeyCode::Char('l') => self.focus_panel = FocusPanel::Types,
            KeyCode::Enter => self.enter_type_detail(),
            _ => {}
        }
    }

    fn handle_detail_keys(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc | KeyCode::Backspace => {
                self.view = View::Dashboard;
                self.detail_scroll_offset = 0;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.detail_scroll_offset = self.detail_scroll_offset.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let max = self
                    .selected_breakdown()
                    .map_or(0, |b| b.materials.len().saturating_sub(1));
                if self.detail_scroll_offset < max {
                    self.detail_scroll_offset += 1;
                }
            }
            _ => {}
        }
    }

    fn previous_category(&mut self) {
        if self.selected_category > 0 {
            self.selected_category -= 1;
            self.selected_type = 0;
        }
    }

    fn next_category(&mut self) {
        if self.selected_category < self.categories.len().saturating_sub(1) {
            self.selected_category += 1;
            self.selected_type = 0;
        }
    }

    fn previous_type(&mut self) {
        self.selected_type = self.selected_type.saturating_sub(1);
    }

    fn next_type(&mut self) {
        let count = self.current_types().len();
        if self.selected_type < count.saturating_sub(1) {
            self.selected_type += 1;
        }
    }

    fn enter_type_detail(&mut self) {
        if self.focus_panel == FocusPanel::Types && self.selected_type_cost().is_some() {
            self.view = View::TypeDetail;
            self.detail_scroll_offset = 0;
        }
    }

    #[must_use]
    pub fn current_category(&self) -> Option<&CategoryTotal> {
        self.categories.get(self.selected_category)
    }

    #[must_use]
    pub fn current_types(&self) -> &[TypeCost] {
        self.current_category()
            .map(|c| c.types.as_slice())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn selected_type_cost(&self) -> Option<&TypeCost> {
        self.current_types().get(self.selected_type)
    }

    #[must_use]
    pub fn selected_breakdown(&self) -> Option<&CostBreakdown> {
        self.selected_type_cost()
            .and_then(|t| self.breakdowns.get(&t.id))
    }

    #[must_use]
    pub fn total_types(&self) -> usize {
        self.categories.iter().map(|c| c.types.len()).sum()
    }

    /// Share of the grand total, in percent.
    #[must_use]
    pub fn share(&self, amount: f64) -> f64 {
        if self.total > 0.0 {
            amount / self.total * 100.0
        } else {
            0.0
        }
    }
}
