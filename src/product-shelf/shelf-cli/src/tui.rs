//! Interactive product browser.

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Position, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use shelf_catalog::{
    CatalogProvider, CatalogStore, CriteriaUpdate, FilterCriteria, Product, StoreOptions,
};
use std::sync::Arc;
use std::time::Duration;

/// Minimum card width; the grid fits as many columns as this allows.
const CARD_WIDTH: u16 = 34;
/// Border plus five content lines.
const CARD_HEIGHT: u16 = 7;

// ============================================================================
// Public entry points
// ============================================================================

/// Run the browser until the user quits. Returns the selected products.
pub fn run_browse(
    provider: Box<dyn CatalogProvider>,
    options: StoreOptions,
    initial: CriteriaUpdate,
) -> Result<Vec<Product>> {
    let mut app = App::new(provider, options, initial);
    app.run()?;
    Ok(app.selected_products())
}

// ============================================================================
// App state
// ============================================================================

struct App {
    store: CatalogStore,
    provider: Box<dyn CatalogProvider>,
    screen: Screen,
    should_quit: bool,
    pending_action: Option<PendingAction>,
}

enum Screen {
    /// Transient placeholder used when taking ownership of the screen via `mem::replace`.
    /// Never rendered or handled.
    Empty,
    Loading(LoadingState),
    Browse(BrowseScreen),
}

struct LoadingState {
    message: String,
    /// Browse state to resume once the load finishes.
    browse: BrowseScreen,
}

enum PendingAction {
    /// Open a URL in the system browser
    OpenUrl { url: String },
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Focus {
    Grid,
    Search,
    MinPrice,
    MaxPrice,
    Category,
}

impl Focus {
    fn cycle(self, forward: bool, with_category: bool) -> Focus {
        let order: &[Focus] = if with_category {
            &[
                Focus::Grid,
                Focus::Search,
                Focus::MinPrice,
                Focus::MaxPrice,
                Focus::Category,
            ]
        } else {
            &[Focus::Grid, Focus::Search, Focus::MinPrice, Focus::MaxPrice]
        };
        let mut index = order.iter().position(|f| *f == self).unwrap_or(0);
        wrapping_nav(&mut index, order.len(), forward);
        order[index]
    }
}

struct BrowseScreen {
    focus: Focus,
    /// Raw text of the filter inputs. Price text that doesn't parse is kept
    /// here so it can be shown (and fixed) while the bound stays unset.
    search_input: String,
    min_input: String,
    max_input: String,
    grid: GridState,
}

impl BrowseScreen {
    fn from_criteria(criteria: &FilterCriteria) -> Self {
        Self {
            focus: Focus::Grid,
            search_input: criteria.search.clone(),
            min_input: criteria.min_price.map(|v| v.to_string()).unwrap_or_default(),
            max_input: criteria.max_price.map(|v| v.to_string()).unwrap_or_default(),
            grid: GridState::default(),
        }
    }

    fn focused_input_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            Focus::Search => Some(&mut self.search_input),
            Focus::MinPrice => Some(&mut self.min_input),
            Focus::MaxPrice => Some(&mut self.max_input),
            Focus::Grid | Focus::Category => None,
        }
    }

    /// Price inputs only take digits and a decimal point.
    fn accepts(&self, c: char) -> bool {
        match self.focus {
            Focus::MinPrice | Focus::MaxPrice => c.is_ascii_digit() || c == '.',
            _ => true,
        }
    }

    fn clear_inputs(&mut self) {
        self.search_input.clear();
        self.min_input.clear();
        self.max_input.clear();
    }

    /// The criteria update equivalent to the current text inputs.
    fn inputs_update(&self) -> CriteriaUpdate {
        CriteriaUpdate::new()
            .search(self.search_input.clone())
            .min_price(parse_bound(&self.min_input))
            .max_price(parse_bound(&self.max_input))
    }
}

/// Cursor and scroll position of the card grid.
#[derive(Debug)]
struct GridState {
    selected: usize,
    offset_row: usize,
    /// Columns used by the last render; vertical movement steps by this.
    columns: usize,
}

impl Default for GridState {
    fn default() -> Self {
        Self {
            selected: 0,
            offset_row: 0,
            columns: 1,
        }
    }
}

impl GridState {
    fn move_horizontal(&mut self, count: usize, forward: bool) {
        if forward {
            if self.selected + 1 < count {
                self.selected += 1;
            }
        } else if self.selected > 0 {
            self.selected -= 1;
        }
    }

    fn move_vertical(&mut self, count: usize, forward: bool) {
        let step = self.columns.max(1);
        if forward {
            if self.selected + step < count {
                self.selected += step;
            }
        } else if self.selected >= step {
            self.selected -= step;
        }
    }

    fn clamp(&mut self, count: usize) {
        self.selected = self.selected.min(count.saturating_sub(1));
    }

    fn scroll_into_view(&mut self, visible_rows: usize) {
        let row = self.selected / self.columns.max(1);
        if row < self.offset_row {
            self.offset_row = row;
        } else if row >= self.offset_row + visible_rows {
            self.offset_row = row + 1 - visible_rows;
        }
    }
}

/// Advance or retreat a wrapping index within `0..count`.
fn wrapping_nav(index: &mut usize, count: usize, forward: bool) {
    if count > 0 {
        *index = if forward {
            (*index + 1) % count
        } else {
            (*index + count - 1) % count
        };
    }
}

/// Empty text means "no bound"; so does text that isn't a finite number.
fn parse_bound(input: &str) -> Option<f64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn bound_is_invalid(input: &str) -> bool {
    !input.trim().is_empty() && parse_bound(input).is_none()
}

/// Step the category criterion through "All" followed by every distinct
/// category of the full catalog.
fn cycle_category(store: &mut CatalogStore, forward: bool) {
    let categories = store.categories();
    let mut index = store
        .criteria()
        .active_category()
        .and_then(|current| categories.iter().position(|c| *c == current))
        .map_or(0, |i| i + 1);
    wrapping_nav(&mut index, categories.len() + 1, forward);
    let choice = index
        .checked_sub(1)
        .and_then(|i| categories.get(i))
        .map(|c| c.to_string());
    store.set_criteria(CriteriaUpdate::new().category(choice));
}

type PanicHook = Box<dyn Fn(&std::panic::PanicHookInfo<'_>) + Sync + Send + 'static>;

/// Install a panic hook that restores the terminal before delegating to the
/// previous hook, so a panic doesn't leave the terminal in raw mode.
/// Returns the previous hook for [`reinstate_hook`].
fn install_restore_hook() -> Arc<PanicHook> {
    let original: Arc<PanicHook> = Arc::new(std::panic::take_hook());
    let delegate = Arc::clone(&original);
    std::panic::set_hook(Box::new(move |info| {
        let _ = ratatui::try_restore();
        let _ = crossterm::execute!(std::io::stdout(), crossterm::cursor::Show);
        (*delegate)(info);
    }));
    original
}

/// Put back the hook that [`install_restore_hook`] replaced.
fn reinstate_hook(original: Arc<PanicHook>) {
    // Dropping the restoring hook releases its clone of `original`.
    drop(std::panic::take_hook());
    match Arc::try_unwrap(original) {
        Ok(hook) => std::panic::set_hook(hook),
        Err(shared) => std::panic::set_hook(Box::new(move |info| (*shared)(info))),
    }
}

fn wait_for_enter() {
    // ratatui::restore() leaves the alternate screen and disables raw mode but
    // does not re-show the cursor, so we do it explicitly here.
    let _ = crossterm::execute!(std::io::stdout(), crossterm::cursor::Show);
    println!("\nPress Enter to return to the browser...");
    let _ = std::io::stdin().read_line(&mut String::new());
}

// ============================================================================
// App implementation
// ============================================================================

impl App {
    fn new(
        provider: Box<dyn CatalogProvider>,
        options: StoreOptions,
        initial: CriteriaUpdate,
    ) -> Self {
        let mut store = CatalogStore::new(options);
        store.set_criteria(initial);
        let browse = BrowseScreen::from_criteria(store.criteria());
        Self {
            store,
            provider,
            screen: Screen::Loading(LoadingState {
                message: "Loading products...".to_string(),
                browse,
            }),
            should_quit: false,
            pending_action: None,
        }
    }

    fn run(&mut self) -> Result<()> {
        let original_hook = install_restore_hook();

        let result = self.run_inner();

        // Always restore the terminal, even if run_inner returned an error.
        ratatui::restore();
        let _ = crossterm::execute!(std::io::stdout(), crossterm::cursor::Show);

        reinstate_hook(original_hook);

        result
    }

    fn run_inner(&mut self) -> Result<()> {
        let mut terminal = ratatui::init();

        loop {
            // Draw first so the loading placeholder is on screen while the
            // blocking fetch runs.
            terminal.draw(|frame| self.render(frame))?;

            if self.process_loading() {
                continue;
            }

            if let Some(action) = self.pending_action.take() {
                ratatui::restore();
                self.execute_action(&action);
                terminal = ratatui::init();
                continue;
            }

            if event::poll(Duration::from_millis(100))?
                && let Event::Key(key) = event::read()?
            {
                // Windows compatibility: only handle Press events
                if key.kind == KeyEventKind::Press {
                    // Ctrl+C quits immediately
                    if key.modifiers.contains(KeyModifiers::CONTROL)
                        && key.code == KeyCode::Char('c')
                    {
                        break;
                    }
                    self.handle_key(key.code);
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    /// Resolve a pending Loading screen. Returns true if a load ran.
    fn process_loading(&mut self) -> bool {
        let screen = std::mem::replace(&mut self.screen, Screen::Empty);
        let Screen::Loading(state) = screen else {
            self.screen = screen;
            return false;
        };

        // A failed load is logged by the store and otherwise swallowed: the
        // grid keeps showing whatever catalog was there before.
        let _ = self.store.load(self.provider.as_ref());

        let mut browse = state.browse;
        browse.grid.clamp(self.store.visible_len());
        self.screen = Screen::Browse(browse);
        true
    }

    fn begin_reload(&mut self) {
        let screen = std::mem::replace(&mut self.screen, Screen::Empty);
        let Screen::Browse(browse) = screen else {
            self.screen = screen;
            return;
        };
        self.screen = Screen::Loading(LoadingState {
            message: "Reloading products...".to_string(),
            browse,
        });
    }

    fn execute_action(&self, action: &PendingAction) {
        match action {
            PendingAction::OpenUrl { url } => {
                if let Err(e) = open::that(url) {
                    tracing::warn!(%url, error = %e, "failed to open browser");
                    println!("Failed to open browser: {}", e);
                    println!("URL: {}", url);
                    wait_for_enter();
                }
            }
        }
    }

    fn selected_products(&self) -> Vec<Product> {
        self.store
            .products()
            .iter()
            .filter(|p| self.store.is_selected(p.id))
            .cloned()
            .collect()
    }

    fn handle_key(&mut self, key: KeyCode) {
        let Screen::Browse(state) = &mut self.screen else {
            return;
        };
        let with_category = self.store.options().category_filter;
        let mut reload = false;

        match state.focus {
            Focus::Grid => {
                let count = self.store.visible_len();
                match key {
                    KeyCode::Up | KeyCode::Char('k') => state.grid.move_vertical(count, false),
                    KeyCode::Down | KeyCode::Char('j') => state.grid.move_vertical(count, true),
                    KeyCode::Left | KeyCode::Char('h') => state.grid.move_horizontal(count, false),
                    KeyCode::Right | KeyCode::Char('l') => state.grid.move_horizontal(count, true),
                    KeyCode::Char(' ') | KeyCode::Enter => {
                        if let Some(product) = self.store.visible_at(state.grid.selected) {
                            let id = product.id;
                            self.store.toggle_selection(id);
                        }
                    }
                    KeyCode::Char('/') => state.focus = Focus::Search,
                    KeyCode::Tab => state.focus = state.focus.cycle(true, with_category),
                    KeyCode::BackTab => state.focus = state.focus.cycle(false, with_category),
                    KeyCode::Char('x') => {
                        state.clear_inputs();
                        self.store.clear_criteria();
                        state.grid.clamp(self.store.visible_len());
                    }
                    KeyCode::Char('o') => {
                        if let Some(product) = self.store.visible_at(state.grid.selected)
                            && !product.thumbnail.is_empty()
                        {
                            self.pending_action = Some(PendingAction::OpenUrl {
                                url: product.thumbnail.clone(),
                            });
                        }
                    }
                    KeyCode::Char('r') => reload = true,
                    KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
                    _ => {}
                }
            }
            Focus::Category => {
                match key {
                    KeyCode::Left | KeyCode::Char('h') => cycle_category(&mut self.store, false),
                    KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(' ') => {
                        cycle_category(&mut self.store, true)
                    }
                    KeyCode::Enter | KeyCode::Esc => state.focus = Focus::Grid,
                    KeyCode::Tab => state.focus = state.focus.cycle(true, with_category),
                    KeyCode::BackTab => state.focus = state.focus.cycle(false, with_category),
                    _ => {}
                }
                state.grid.clamp(self.store.visible_len());
            }
            Focus::Search | Focus::MinPrice | Focus::MaxPrice => {
                let mut edited = false;
                match key {
                    KeyCode::Char(c) => {
                        if state.accepts(c)
                            && let Some(input) = state.focused_input_mut()
                        {
                            input.push(c);
                            edited = true;
                        }
                    }
                    KeyCode::Backspace => {
                        if let Some(input) = state.focused_input_mut() {
                            edited = input.pop().is_some();
                        }
                    }
                    KeyCode::Enter | KeyCode::Esc => state.focus = Focus::Grid,
                    KeyCode::Tab => state.focus = state.focus.cycle(true, with_category),
                    KeyCode::BackTab => state.focus = state.focus.cycle(false, with_category),
                    _ => {}
                }
                if edited {
                    self.store.set_criteria(state.inputs_update());
                    state.grid.clamp(self.store.visible_len());
                }
            }
        }

        if reload {
            self.begin_reload();
        }
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    fn render(&mut self, frame: &mut Frame) {
        match &mut self.screen {
            Screen::Empty => {}
            Screen::Loading(state) => render_loading(frame, state),
            Screen::Browse(state) => render_browse(frame, &self.store, state),
        }
    }
}

// ============================================================================
// Screen renderers
// ============================================================================

fn render_loading(frame: &mut Frame, state: &LoadingState) {
    let area = frame.area();
    let text = Paragraph::new(state.message.as_str())
        .style(Style::default().fg(Color::Cyan))
        .centered();

    let vertical = Layout::vertical([Constraint::Length(1)]).flex(Flex::Center);
    let [center] = vertical.areas(area);
    frame.render_widget(text, center);
}

fn render_browse(frame: &mut Frame, store: &CatalogStore, state: &mut BrowseScreen) {
    let area = frame.area();

    let [header, filters, grid, footer] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .areas(area);

    frame.render_widget(
        Paragraph::new("Products")
            .style(Style::default().bold())
            .centered(),
        header,
    );

    render_filters(frame, store, state, filters);
    render_grid(frame, store, state, grid);

    let hints = match state.focus {
        Focus::Grid => {
            "←↑↓→/hjkl Move | Space Select | / Search | Tab Filters | x Clear | o Open | r Reload | q Quit"
        }
        Focus::Category => "←→ Change | Tab Next | Enter/Esc Done",
        _ => "Type to filter | Tab Next | Enter/Esc Done",
    };
    let status = format!(
        "{}/{} products | {} selected | {}",
        store.visible_len(),
        store.products().len(),
        store.selection().len(),
        hints
    );
    frame.render_widget(
        Paragraph::new(status).style(Style::default().fg(Color::DarkGray)),
        footer,
    );
}

fn render_filter_field(
    frame: &mut Frame,
    title: &str,
    value: &str,
    focused: bool,
    value_style: Style,
    area: Rect,
) {
    let border_style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    frame.render_widget(
        Paragraph::new(value).style(value_style).block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(border_style),
        ),
        area,
    );
}

fn price_style(input: &str) -> Style {
    if bound_is_invalid(input) {
        Style::default().fg(Color::Red)
    } else {
        Style::default()
    }
}

fn render_filters(frame: &mut Frame, store: &CatalogStore, state: &BrowseScreen, area: Rect) {
    let with_category = store.options().category_filter;
    let mut constraints = vec![
        Constraint::Fill(1),
        Constraint::Length(14),
        Constraint::Length(14),
    ];
    if with_category {
        constraints.push(Constraint::Length(26));
    }
    let areas = Layout::horizontal(constraints).split(area);

    render_filter_field(
        frame,
        " Search ",
        &state.search_input,
        state.focus == Focus::Search,
        Style::default(),
        areas[0],
    );
    render_filter_field(
        frame,
        " Min Price ",
        &state.min_input,
        state.focus == Focus::MinPrice,
        price_style(&state.min_input),
        areas[1],
    );
    render_filter_field(
        frame,
        " Max Price ",
        &state.max_input,
        state.focus == Focus::MaxPrice,
        price_style(&state.max_input),
        areas[2],
    );

    if with_category {
        let label = store.criteria().active_category().unwrap_or("All");
        let focused = state.focus == Focus::Category;
        let value = if focused {
            format!("◀ {} ▶", label)
        } else {
            label.to_string()
        };
        render_filter_field(frame, " Category ", &value, focused, Style::default(), areas[3]);
    }

    let cursor = match state.focus {
        Focus::Search => Some((areas[0], &state.search_input)),
        Focus::MinPrice => Some((areas[1], &state.min_input)),
        Focus::MaxPrice => Some((areas[2], &state.max_input)),
        Focus::Grid | Focus::Category => None,
    };
    if let Some((input_area, text)) = cursor {
        // +1 for border
        frame.set_cursor_position(Position::new(
            input_area.x + 1 + text.chars().count() as u16,
            input_area.y + 1,
        ));
    }
}

/// How many cards fit side by side in `width` columns.
fn card_columns(width: u16) -> usize {
    usize::from((width / CARD_WIDTH).max(1))
}

fn render_grid(frame: &mut Frame, store: &CatalogStore, state: &mut BrowseScreen, area: Rect) {
    let count = store.visible_len();
    if count == 0 {
        let message = if store.products().is_empty() {
            "  No products loaded. Press r to reload."
        } else {
            "  No products match the current filters."
        };
        frame.render_widget(
            Paragraph::new(message)
                .style(Style::default().fg(Color::DarkGray))
                .block(Block::default().borders(Borders::ALL)),
            area,
        );
        return;
    }

    let columns = card_columns(area.width);
    let rows = usize::from((area.height / CARD_HEIGHT).max(1));
    state.grid.columns = columns;
    state.grid.scroll_into_view(rows);

    let card_width = area.width / columns as u16;
    for row in 0..rows {
        for col in 0..columns {
            let index = (state.grid.offset_row + row) * columns + col;
            let Some(product) = store.visible_at(index) else {
                return;
            };
            let card = Rect::new(
                area.x + col as u16 * card_width,
                area.y + row as u16 * CARD_HEIGHT,
                card_width,
                CARD_HEIGHT,
            )
            .intersection(area);
            render_card(
                frame,
                product,
                store.is_selected(product.id),
                index == state.grid.selected,
                card,
            );
        }
    }
}

fn render_card(frame: &mut Frame, product: &Product, selected: bool, cursor: bool, area: Rect) {
    let mark = if selected { "[x]" } else { "[ ]" };
    let border_style = if cursor {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else if selected {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let lines = vec![
        Line::from(Span::styled(
            product.title.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            product.display_price(),
            Style::default().fg(Color::Green),
        )),
        Line::from(Span::styled(
            format!("★ {:.2}", product.rating),
            Style::default().fg(Color::Yellow),
        )),
        Line::from(Span::styled(
            product.category.as_str(),
            Style::default().fg(Color::Magenta),
        )),
        Line::from(Span::styled(
            product.thumbnail.as_str(),
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let block = Block::default()
        .title(format!(" {} #{} ", mark, product.id))
        .borders(Borders::ALL)
        .border_style(border_style);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelf_catalog::LoadFailure;
    use std::cell::Cell;
    use std::rc::Rc;

    // ====================================================================
    // Fixture helpers
    // ====================================================================

    fn product(id: u64, title: &str, price: f64, category: &str) -> Product {
        Product {
            id,
            title: title.to_string(),
            price,
            rating: 4.5,
            category: category.to_string(),
            thumbnail: format!("https://cdn.example.com/{id}.png"),
        }
    }

    fn catalog() -> Vec<Product> {
        vec![
            product(1, "Phone", 500.0, "electronics"),
            product(2, "Shirt", 20.0, "clothing"),
            product(3, "Laptop", 900.0, "electronics"),
            product(4, "Lipstick", 9.5, "beauty"),
        ]
    }

    struct FixedProvider(Vec<Product>);

    impl CatalogProvider for FixedProvider {
        fn fetch(&self) -> Result<Vec<Product>, LoadFailure> {
            Ok(self.0.clone())
        }
    }

    /// Fails every fetch; the shared counter lets tests see how often.
    struct FailingProvider(Rc<Cell<usize>>);

    impl CatalogProvider for FailingProvider {
        fn fetch(&self) -> Result<Vec<Product>, LoadFailure> {
            self.0.set(self.0.get() + 1);
            Err(LoadFailure::Status {
                url: "https://dummyjson.com/products".to_string(),
                status: reqwest::StatusCode::BAD_GATEWAY,
            })
        }
    }

    /// Helper: an App already showing the browse screen (bypasses loading).
    fn make_app_with(options: StoreOptions, products: Vec<Product>) -> App {
        let store = CatalogStore::with_products(options, products.clone());
        let browse = BrowseScreen::from_criteria(store.criteria());
        App {
            store,
            provider: Box::new(FixedProvider(products)),
            screen: Screen::Browse(browse),
            should_quit: false,
            pending_action: None,
        }
    }

    fn make_app() -> App {
        make_app_with(StoreOptions::default(), catalog())
    }

    fn unwrap_browse(app: &App) -> &BrowseScreen {
        match &app.screen {
            Screen::Browse(state) => state,
            _ => panic!("Expected Browse screen"),
        }
    }

    fn unwrap_browse_mut(app: &mut App) -> &mut BrowseScreen {
        match &mut app.screen {
            Screen::Browse(state) => state,
            _ => panic!("Expected Browse screen"),
        }
    }

    fn visible_ids(app: &App) -> Vec<u64> {
        app.store.visible().map(|p| p.id).collect()
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(KeyCode::Char(c));
        }
    }

    // ====================================================================
    // Pure helpers
    // ====================================================================

    #[test]
    fn parse_bound_handles_empty_and_garbage() {
        assert_eq!(parse_bound(""), None);
        assert_eq!(parse_bound("  "), None);
        assert_eq!(parse_bound("100"), Some(100.0));
        assert_eq!(parse_bound("9.5"), Some(9.5));
        assert_eq!(parse_bound("1.2.3"), None);
        assert!(bound_is_invalid("1.2.3"));
        assert!(!bound_is_invalid(""));
    }

    #[test]
    fn card_columns_never_zero() {
        assert_eq!(card_columns(10), 1);
        assert_eq!(card_columns(80), 2);
        assert_eq!(card_columns(120), 3);
    }

    #[test]
    fn focus_cycle_skips_category_when_disabled() {
        assert_eq!(Focus::MaxPrice.cycle(true, true), Focus::Category);
        assert_eq!(Focus::MaxPrice.cycle(true, false), Focus::Grid);
        assert_eq!(Focus::Grid.cycle(false, false), Focus::MaxPrice);
    }

    #[test]
    fn inputs_seeded_from_initial_criteria() {
        let criteria = FilterCriteria {
            search: "pho".to_string(),
            min_price: Some(100.0),
            max_price: Some(9.5),
            category: None,
        };
        let browse = BrowseScreen::from_criteria(&criteria);
        assert_eq!(browse.search_input, "pho");
        assert_eq!(browse.min_input, "100");
        assert_eq!(browse.max_input, "9.5");
    }

    // ====================================================================
    // Loading
    // ====================================================================

    #[test]
    fn initial_load_moves_to_browse() {
        let mut app = App::new(
            Box::new(FixedProvider(catalog())),
            StoreOptions::default(),
            CriteriaUpdate::new().search("pho"),
        );
        assert!(matches!(app.screen, Screen::Loading(_)));

        assert!(app.process_loading());

        assert_eq!(unwrap_browse(&app).search_input, "pho");
        assert_eq!(visible_ids(&app), vec![1]);
        assert!(!app.process_loading(), "nothing left to load");
    }

    #[test]
    fn failed_load_shows_empty_browse_screen() {
        let calls = Rc::new(Cell::new(0));
        let mut app = App::new(
            Box::new(FailingProvider(Rc::clone(&calls))),
            StoreOptions::default(),
            CriteriaUpdate::new(),
        );

        app.process_loading();

        assert!(matches!(app.screen, Screen::Browse(_)));
        assert!(!app.store.is_loading());
        assert!(app.store.products().is_empty());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn r_reloads_and_keeps_inputs() {
        let calls = Rc::new(Cell::new(0));
        let mut app = make_app();
        app.provider = Box::new(FailingProvider(Rc::clone(&calls)));
        unwrap_browse_mut(&mut app).search_input = "sh".to_string();

        app.handle_key(KeyCode::Char('r'));
        assert!(matches!(app.screen, Screen::Loading(_)));

        app.process_loading();
        assert_eq!(calls.get(), 1);
        assert_eq!(unwrap_browse(&app).search_input, "sh");
        assert_eq!(app.store.products().len(), 4, "failed reload keeps catalog");
    }

    // ====================================================================
    // Key handling
    // ====================================================================

    #[test]
    fn grid_navigation_clamps_at_edges() {
        let mut app = make_app();
        unwrap_browse_mut(&mut app).grid.columns = 2;

        app.handle_key(KeyCode::Char('l'));
        assert_eq!(unwrap_browse(&app).grid.selected, 1);
        app.handle_key(KeyCode::Char('j'));
        assert_eq!(unwrap_browse(&app).grid.selected, 3);
        app.handle_key(KeyCode::Char('j'));
        assert_eq!(unwrap_browse(&app).grid.selected, 3);
        app.handle_key(KeyCode::Char('l'));
        assert_eq!(unwrap_browse(&app).grid.selected, 3);
        app.handle_key(KeyCode::Up);
        assert_eq!(unwrap_browse(&app).grid.selected, 1);
        app.handle_key(KeyCode::Left);
        app.handle_key(KeyCode::Left);
        assert_eq!(unwrap_browse(&app).grid.selected, 0);
    }

    #[test]
    fn space_toggles_card_under_cursor() {
        let mut app = make_app();
        app.handle_key(KeyCode::Right);

        app.handle_key(KeyCode::Char(' '));
        assert!(app.store.is_selected(2));

        app.handle_key(KeyCode::Enter);
        assert!(!app.store.is_selected(2));
        assert!(app.store.selection().is_empty());
    }

    #[test]
    fn search_typing_filters_immediately() {
        let mut app = make_app();

        app.handle_key(KeyCode::Char('/'));
        assert_eq!(unwrap_browse(&app).focus, Focus::Search);

        type_text(&mut app, "LIP");
        assert_eq!(unwrap_browse(&app).search_input, "LIP");
        assert_eq!(visible_ids(&app), vec![4]);

        app.handle_key(KeyCode::Backspace);
        app.handle_key(KeyCode::Backspace);
        assert_eq!(visible_ids(&app), vec![3, 4]);

        app.handle_key(KeyCode::Esc);
        assert_eq!(unwrap_browse(&app).focus, Focus::Grid);
        assert!(!app.should_quit);
    }

    #[test]
    fn search_keys_are_text_not_commands() {
        let mut app = make_app();
        app.handle_key(KeyCode::Char('/'));
        type_text(&mut app, "q");
        assert!(!app.should_quit);
        assert_eq!(unwrap_browse(&app).search_input, "q");
    }

    #[test]
    fn price_inputs_filter_and_reject_letters() {
        let mut app = make_app();
        app.handle_key(KeyCode::Tab);
        app.handle_key(KeyCode::Tab);
        assert_eq!(unwrap_browse(&app).focus, Focus::MinPrice);

        type_text(&mut app, "1a00");
        assert_eq!(unwrap_browse(&app).min_input, "100");
        assert_eq!(visible_ids(&app), vec![1, 3]);

        app.handle_key(KeyCode::Tab);
        type_text(&mut app, "600");
        assert_eq!(visible_ids(&app), vec![1]);
    }

    #[test]
    fn unparseable_price_leaves_bound_unset() {
        let mut app = make_app();
        app.handle_key(KeyCode::Tab);
        app.handle_key(KeyCode::Tab);
        type_text(&mut app, "1.2.3");

        assert_eq!(app.store.criteria().min_price, None);
        assert_eq!(visible_ids(&app), vec![1, 2, 3, 4]);
    }

    #[test]
    fn category_cycles_through_all_and_wraps() {
        let mut app = make_app();
        unwrap_browse_mut(&mut app).focus = Focus::Category;

        app.handle_key(KeyCode::Right);
        assert_eq!(app.store.criteria().active_category(), Some("electronics"));
        assert_eq!(visible_ids(&app), vec![1, 3]);

        app.handle_key(KeyCode::Right);
        app.handle_key(KeyCode::Right);
        assert_eq!(app.store.criteria().active_category(), Some("beauty"));

        app.handle_key(KeyCode::Right);
        assert_eq!(app.store.criteria().active_category(), None);
        assert_eq!(visible_ids(&app), vec![1, 2, 3, 4]);

        app.handle_key(KeyCode::Left);
        assert_eq!(app.store.criteria().active_category(), Some("beauty"));
    }

    #[test]
    fn cursor_clamped_when_filter_shrinks_grid() {
        let mut app = make_app();
        unwrap_browse_mut(&mut app).grid.selected = 3;

        app.handle_key(KeyCode::Char('/'));
        type_text(&mut app, "phone");
        assert_eq!(unwrap_browse(&app).grid.selected, 0);
    }

    #[test]
    fn x_clears_every_filter() {
        let mut app = make_app();
        app.handle_key(KeyCode::Char('/'));
        type_text(&mut app, "phone");
        app.handle_key(KeyCode::Tab);
        type_text(&mut app, "1");
        app.handle_key(KeyCode::Enter);
        app.store
            .set_criteria(CriteriaUpdate::new().category(Some("electronics".to_string())));

        app.handle_key(KeyCode::Char('x'));

        let state = unwrap_browse(&app);
        assert!(state.search_input.is_empty());
        assert!(state.min_input.is_empty());
        assert!(app.store.criteria().is_empty());
        assert_eq!(app.store.visible_len(), 4);
    }

    #[test]
    fn o_queues_thumbnail_url() {
        let mut app = make_app();
        app.handle_key(KeyCode::Char('o'));
        match &app.pending_action {
            Some(PendingAction::OpenUrl { url }) => {
                assert_eq!(url, "https://cdn.example.com/1.png")
            }
            None => panic!("expected a pending OpenUrl"),
        }
    }

    #[test]
    fn q_and_esc_quit_from_grid() {
        let mut app = make_app();
        app.handle_key(KeyCode::Char('q'));
        assert!(app.should_quit);

        let mut app = make_app();
        app.handle_key(KeyCode::Esc);
        assert!(app.should_quit);
    }

    #[test]
    fn selected_products_in_catalog_order() {
        let mut app = make_app();
        app.store.toggle_selection(3);
        app.store.toggle_selection(1);
        let ids: Vec<u64> = app.selected_products().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    // ====================================================================
    // Rendering
    // ====================================================================

    /// Helper: render into an in-memory terminal and return the buffer content
    /// as a string (one line per row, padded with spaces).
    fn render_to_string(width: u16, height: u16, draw: impl FnOnce(&mut Frame)) -> String {
        use ratatui::Terminal;
        use ratatui::backend::TestBackend;

        let backend = TestBackend::new(width, height);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(draw).unwrap();
        terminal.backend().to_string()
    }

    fn render_app_to_string(app: &mut App, width: u16, height: u16) -> String {
        render_to_string(width, height, |frame| app.render(frame))
    }

    #[test]
    fn app_renders_loading_screen_without_io() {
        let mut app = App::new(
            Box::new(FixedProvider(Vec::new())),
            StoreOptions::default(),
            CriteriaUpdate::new(),
        );
        let output = render_app_to_string(&mut app, 60, 10);
        assert!(
            output.contains("Loading products..."),
            "Expected loading message in:\n{}",
            output
        );
    }

    #[test]
    fn cards_show_title_price_rating_and_selection() {
        let mut app = make_app();
        app.store.toggle_selection(2);
        let output = render_app_to_string(&mut app, 80, 20);

        assert!(output.contains("Phone"), "Expected 'Phone' in:\n{}", output);
        assert!(output.contains("$500.00"), "Expected price in:\n{}", output);
        assert!(output.contains("★ 4.50"), "Expected rating in:\n{}", output);
        assert!(output.contains("[x] #2"), "Expected selected mark in:\n{}", output);
        assert!(output.contains("[ ] #1"), "Expected unselected mark in:\n{}", output);
        assert!(
            output.contains("4/4 products | 1 selected"),
            "Expected status line in:\n{}",
            output
        );
    }

    #[test]
    fn filter_bar_shows_category_box_only_when_enabled() {
        let mut app = make_app();
        let output = render_app_to_string(&mut app, 100, 20);
        assert!(output.contains("Search"), "Expected Search in:\n{}", output);
        assert!(output.contains("Min Price"), "Expected Min Price in:\n{}", output);
        assert!(output.contains("Category"), "Expected Category in:\n{}", output);
        assert!(output.contains("All"), "Expected 'All' option in:\n{}", output);

        let mut app = make_app_with(
            StoreOptions {
                category_filter: false,
            },
            catalog(),
        );
        let output = render_app_to_string(&mut app, 100, 20);
        assert!(!output.contains("Category"), "Unexpected Category in:\n{}", output);
    }

    #[test]
    fn grid_scrolls_to_keep_cursor_visible() {
        let mut app = make_app();
        // One column, room for a single card row.
        unwrap_browse_mut(&mut app).grid.selected = 3;
        let output = render_app_to_string(&mut app, 40, 12);
        assert!(output.contains("Lipstick"), "Expected 'Lipstick' in:\n{}", output);
        assert!(!output.contains("Phone"), "Unexpected 'Phone' in:\n{}", output);
        assert_eq!(unwrap_browse(&app).grid.offset_row, 3);
    }

    #[test]
    fn empty_results_render_message() {
        let mut app = make_app();
        app.store.set_criteria(CriteriaUpdate::new().search("zzz"));
        let output = render_app_to_string(&mut app, 80, 12);
        assert!(
            output.contains("No products match the current filters."),
            "Expected empty-state message in:\n{}",
            output
        );
        assert!(output.contains("0/4 products"), "Expected status in:\n{}", output);
    }

    #[test]
    fn unloaded_catalog_renders_reload_hint() {
        let mut app = make_app_with(StoreOptions::default(), Vec::new());
        let output = render_app_to_string(&mut app, 80, 12);
        assert!(
            output.contains("No products loaded. Press r to reload."),
            "Expected reload hint in:\n{}",
            output
        );
    }

    #[test]
    fn reinstate_hook_puts_previous_hook_back() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        static CALLS: AtomicUsize = AtomicUsize::new(0);
        const MESSAGE: &str = "reinstated hook check";

        std::panic::set_hook(Box::new(|info| {
            if info.payload().downcast_ref::<&str>() == Some(&MESSAGE) {
                CALLS.fetch_add(1, Ordering::SeqCst);
            }
        }));

        let original = install_restore_hook();
        reinstate_hook(original);

        let result = std::panic::catch_unwind(|| panic!("reinstated hook check"));
        let _ = std::panic::take_hook();

        assert!(result.is_err());
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }
}
