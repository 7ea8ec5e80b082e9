mod layout;

use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use inkpad_config::{Config, KeyPolicySetting};
use inkpad_engine::{
    DeleteDirection, DocumentEntry, DocumentStore, Editor, EditorEvent, Key, KeyInput, KeyPolicy,
    Point, PointerTarget, SaveRequest, SelectionEvents, SelectionRange, Tag, TextEdit,
    ToolbarView, WRAP_ACTIONS, WrapOutcome, WrapTag, io,
};
use layout::{TerminalGeometry, TextLayout, to_area, toolbar_metrics};
use log::{info, warn};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};
use std::{
    env, fs,
    io::{Stdout, stdout},
    path::PathBuf,
    process,
};

const PLACEHOLDER: &str = "<p>Start writing, or pick a document on the left.</p>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Sidebar,
    Editor,
}

struct App {
    store: DocumentStore,
    documents: Vec<DocumentEntry>,
    document_list_state: ListState,
    events: SelectionEvents,
    editor: Editor,
    /// Title used when saving; the loaded document's name or the default.
    title: String,
    default_title: String,
    anchor: usize,
    focus_offset: usize,
    focus: Focus,
    editor_area: Rect,
    dragging: bool,
    status: String,
}

impl App {
    fn new(documents_path: PathBuf, key_policy: KeyPolicy, default_title: String) -> Result<Self> {
        let store = DocumentStore::new(documents_path);
        let events = SelectionEvents::new();
        let editor = Editor::mount(
            &events,
            PLACEHOLDER,
            TerminalGeometry::new(Rect::default()),
            key_policy,
        )
        .with_toolbar(ToolbarView::new(toolbar_metrics()));

        let mut app = Self {
            store,
            documents: Vec::new(),
            document_list_state: ListState::default(),
            events,
            editor,
            title: default_title.clone(),
            default_title,
            anchor: 0,
            focus_offset: 0,
            focus: Focus::Editor,
            editor_area: Rect::default(),
            dragging: false,
            status: String::from("Ready"),
        };
        app.refresh_documents()?;
        Ok(app)
    }

    fn refresh_documents(&mut self) -> Result<()> {
        self.documents = self.store.list_documents()?;
        if self.documents.is_empty() {
            self.document_list_state.select(None);
        } else if self.document_list_state.selected().is_none() {
            self.document_list_state.select(Some(0));
        }
        Ok(())
    }

    fn next_document(&mut self) {
        if self.documents.is_empty() {
            return;
        }
        let i = match self.document_list_state.selected() {
            Some(i) => (i + 1) % self.documents.len(),
            None => 0,
        };
        self.document_list_state.select(Some(i));
    }

    fn previous_document(&mut self) {
        if self.documents.is_empty() {
            return;
        }
        let i = match self.document_list_state.selected() {
            Some(0) | None => self.documents.len() - 1,
            Some(i) => i - 1,
        };
        self.document_list_state.select(Some(i));
    }

    fn open_selected_document(&mut self) {
        let Some(entry) = self
            .document_list_state
            .selected()
            .and_then(|index| self.documents.get(index))
            .cloned()
        else {
            return;
        };
        match self.store.read_document(&entry.path) {
            Ok(markup) => {
                self.editor.set_content(&markup);
                self.title = entry.name.clone();
                self.anchor = 0;
                self.focus_offset = 0;
                self.focus = Focus::Editor;
                self.status = format!("Opened {}", entry.path);
            }
            Err(e) => {
                warn!("Failed to open {}: {}", entry.path, e);
                self.status = format!("Error reading document: {e}");
            }
        }
    }

    fn open_file(&mut self, relative: &str) {
        if let Some(index) = self
            .documents
            .iter()
            .position(|entry| entry.path.as_str() == relative)
        {
            self.document_list_state.select(Some(index));
            self.open_selected_document();
        } else {
            self.status = format!("No document named {relative}");
        }
    }

    fn save(&mut self) {
        let request = SaveRequest::new(self.title.clone(), self.editor.content());
        let response = self.store.save(&request);
        self.status = match &response.file_path {
            Some(path) => format!("{} ({})", response.message, path),
            None => response.message.clone(),
        };
        if response.success
            && let Err(e) = self.refresh_documents()
        {
            warn!("Failed to refresh documents: {e}");
        }
    }

    fn new_document(&mut self) {
        self.editor.set_content("<p></p>");
        self.title = self.default_title.clone();
        self.anchor = 0;
        self.focus_offset = 0;
        self.status = String::from("New document");
    }

    fn text_layout(&self) -> TextLayout {
        self.editor
            .with_document(|doc| TextLayout::build(doc, self.editor_area.width))
    }

    /// Reports the current caret/selection the way a browser would after
    /// the selection moved.
    fn publish_selection(&self) {
        let range = self.editor.with_document(|doc| {
            SelectionRange::from_offsets(doc, self.anchor, self.focus_offset)
        });
        self.events.emit(&EditorEvent::SelectionChange(Some(range)));
    }

    fn activate(&mut self, tag: WrapTag) {
        match self.editor.activate(tag) {
            Ok(outcome) => {
                if let Some(offsets) = self.editor.selection_offsets() {
                    self.anchor = offsets.start;
                    self.focus_offset = offsets.end;
                }
                self.status = match outcome {
                    WrapOutcome::Wrapped(_) => format!("Applied {tag}"),
                    WrapOutcome::Unwrapped(_) => format!("Removed {tag}"),
                    WrapOutcome::NoOp => String::from("Nothing selected"),
                };
            }
            Err(e) => self.status = e.to_string(),
        }
    }

    /// Types at the caret, then reports the caret the edit left so the
    /// observer sees the collapsed selection.
    fn edit(&mut self, edit: TextEdit<'_>) {
        if self.editor.selection().is_none() {
            self.publish_selection();
        }
        match self.editor.edit(edit) {
            Ok(Some(_)) => {
                if let Some(offsets) = self.editor.selection_offsets() {
                    self.anchor = offsets.start;
                    self.focus_offset = offsets.end;
                }
                self.events
                    .emit(&EditorEvent::SelectionChange(self.editor.selection()));
                self.status = String::from("Modified");
            }
            Ok(None) => {}
            Err(e) => self.status = e.to_string(),
        }
    }

    fn handle_editor_key(&mut self, key: KeyEvent) {
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        // Toolbar shortcuts act like clicking the button
        if let KeyCode::Char(c) = key.code
            && self.editor.toolbar_state().is_visible()
            && let Some(action) = c
                .to_digit(10)
                .and_then(|n| (n as usize).checked_sub(1))
                .and_then(|i| WRAP_ACTIONS.get(i))
        {
            self.activate(action.tag);
            return;
        }

        self.events.emit(&EditorEvent::KeyDown(KeyInput::new(
            to_editor_key(key.code),
            shift,
            true,
        )));

        match key.code {
            KeyCode::Char(c) if !ctrl => {
                let mut buffer = [0; 4];
                let text: &str = c.encode_utf8(&mut buffer);
                self.edit(TextEdit::Insert(text));
                return;
            }
            KeyCode::Backspace => {
                self.edit(TextEdit::Delete(DeleteDirection::Backward));
                return;
            }
            KeyCode::Delete => {
                self.edit(TextEdit::Delete(DeleteDirection::Forward));
                return;
            }
            KeyCode::Enter => {
                self.edit(TextEdit::Paragraph);
                return;
            }
            _ => {}
        }

        let layout = self.text_layout();
        let moved = match key.code {
            KeyCode::Left => Some(layout.previous_offset(self.focus_offset)),
            KeyCode::Right => Some(layout.next_offset(self.focus_offset)),
            KeyCode::Up => Some(layout.vertical_offset(self.focus_offset, false)),
            KeyCode::Down => Some(layout.vertical_offset(self.focus_offset, true)),
            KeyCode::Home => Some(0),
            KeyCode::End => Some(layout.text_len),
            _ => None,
        };
        if let Some(offset) = moved {
            self.focus_offset = offset;
            if !shift {
                self.anchor = offset;
            }
            self.publish_selection();
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let position = Position::new(mouse.column, mouse.row);
        let inside_editor = self.editor_area.contains(position);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let point = Point::new(f32::from(mouse.column), f32::from(mouse.row));
                let toolbar = self.editor.toolbar_layout();
                if let Some(layout) = toolbar.filter(|layout| layout.contains(point)) {
                    self.events.emit(&EditorEvent::PointerDown {
                        target: PointerTarget::Toolbar,
                    });
                    if let Some(action) = layout.hit_test(point) {
                        self.activate(action.tag);
                    }
                    return;
                }
                if inside_editor {
                    self.events.emit(&EditorEvent::PointerDown {
                        target: PointerTarget::Surface,
                    });
                    self.focus = Focus::Editor;
                    self.dragging = true;
                    let offset = self.offset_at(position);
                    self.anchor = offset;
                    self.focus_offset = offset;
                    self.publish_selection();
                } else {
                    self.events.emit(&EditorEvent::PointerDown {
                        target: PointerTarget::Outside,
                    });
                }
            }
            MouseEventKind::Drag(MouseButton::Left) if self.dragging => {
                self.focus_offset = self.offset_at(position);
                self.publish_selection();
            }
            MouseEventKind::Up(MouseButton::Left) => {
                let target = if self.dragging {
                    PointerTarget::Surface
                } else {
                    PointerTarget::Outside
                };
                self.dragging = false;
                self.events.emit(&EditorEvent::Click {
                    target,
                    collapsed: self.anchor == self.focus_offset,
                });
            }
            _ => {}
        }
    }

    fn offset_at(&self, position: Position) -> usize {
        let x = position.x.saturating_sub(self.editor_area.x);
        let y = position.y.saturating_sub(self.editor_area.y);
        self.text_layout().offset_at(x, y)
    }

    /// Keeps the observer's geometry in step with where the editor is drawn.
    fn set_editor_area(&mut self, area: Rect) {
        if area != self.editor_area {
            self.editor_area = area;
            self.editor.set_geometry(TerminalGeometry::new(area));
        }
    }
}

fn to_editor_key(code: KeyCode) -> Key {
    match code {
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Enter => Key::Enter,
        KeyCode::Tab | KeyCode::BackTab => Key::Tab,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Delete => Key::Delete,
        KeyCode::Esc => Key::Escape,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,
        _ => Key::Other,
    }
}

fn to_key_policy(setting: KeyPolicySetting) -> KeyPolicy {
    match setting {
        KeyPolicySetting::HideOnAnyKey => KeyPolicy::HideOnAnyKey,
        KeyPolicySetting::RecomputeOnNavigation => KeyPolicy::RecomputeOnNavigation,
    }
}

fn init_logging() -> Result<()> {
    let log_path = Config::log_path();
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn main() -> Result<()> {
    // Determine documents path from CLI args or config file
    let args: Vec<String> = env::args().collect();
    let config_path = Config::config_path();
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };

    let (documents_path, from_config) = match (args.get(1), &config) {
        (Some(path), _) => (PathBuf::from(path), false),
        (None, Some(config)) => (config.documents_path.clone(), true),
        (None, None) => {
            eprintln!("Error: No documents path provided and no config file found");
            eprintln!("Usage: {} [documents-folder] [initial-file]", args[0]);
            eprintln!("Or create a config file at {}", config_path.display());
            process::exit(1);
        }
    };
    if args.len() > 3 {
        eprintln!("Usage: {} [documents-folder] [initial-file]", args[0]);
        process::exit(1);
    }
    let editor_config = config.map(|config| config.editor).unwrap_or_default();

    if let Err(e) = fs::create_dir_all(&documents_path) {
        eprintln!("Error: cannot create '{}': {e}", documents_path.display());
        process::exit(1);
    }
    if let Err(e) = io::validate_documents_dir(&documents_path) {
        let source = if from_config {
            format!(" from config file '{}'", config_path.display())
        } else {
            String::new()
        };
        eprintln!(
            "Error: Documents path '{}'{} is invalid: {e}",
            documents_path.display(),
            source
        );
        process::exit(1);
    }

    init_logging()?;
    info!("Starting inkpad in {}", documents_path.display());

    let mut app = App::new(
        documents_path,
        to_key_policy(editor_config.key_policy),
        editor_config.default_title,
    )?;
    if let Some(initial) = args.get(2) {
        app.open_file(initial);
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
                match key.code {
                    KeyCode::Char('c') if ctrl => return Ok(()),
                    KeyCode::Char('s') if ctrl => app.save(),
                    KeyCode::Enter if ctrl => app.save(),
                    KeyCode::Char('n') if ctrl => app.new_document(),
                    KeyCode::Tab => {
                        app.focus = match app.focus {
                            Focus::Sidebar => Focus::Editor,
                            Focus::Editor => Focus::Sidebar,
                        };
                    }
                    _ if app.focus == Focus::Sidebar => match key.code {
                        KeyCode::Char('q') => return Ok(()),
                        KeyCode::Down | KeyCode::Char('j') => app.next_document(),
                        KeyCode::Up | KeyCode::Char('k') => app.previous_document(),
                        KeyCode::Enter => app.open_selected_document(),
                        _ => {}
                    },
                    _ => app.handle_editor_key(key),
                }
            }
            Event::Mouse(mouse) => app.handle_mouse(mouse),
            _ => {}
        }
    }
}

fn run_style(tags: &[Tag]) -> Style {
    let mut style = Style::default();
    for tag in tags {
        style = match tag {
            Tag::Strong | Tag::B => style.add_modifier(Modifier::BOLD),
            Tag::Em | Tag::I => style.add_modifier(Modifier::ITALIC),
            Tag::U => style.add_modifier(Modifier::UNDERLINED),
            Tag::Code => style.fg(Color::Green),
            Tag::H1 | Tag::H2 => style.fg(Color::Cyan).add_modifier(Modifier::BOLD),
            Tag::Blockquote => style.fg(Color::Gray),
            _ => style,
        };
    }
    style
}

fn ui(f: &mut Frame, app: &mut App) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)].as_ref())
        .split(f.area());

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(25), Constraint::Percentage(75)].as_ref())
        .split(outer[0]);

    let focused = Style::default().fg(Color::Yellow);

    // Documents panel
    let document_items: Vec<ListItem> = app
        .documents
        .iter()
        .map(|entry| ListItem::new(Line::from(format!("{:>3} {}", entry.id, entry.name))))
        .collect();
    let mut documents_block = Block::default().borders(Borders::ALL).title("Documents");
    if app.focus == Focus::Sidebar {
        documents_block = documents_block.border_style(focused);
    }
    let documents_list = List::new(document_items)
        .block(documents_block)
        .highlight_style(Style::default().bg(Color::Yellow).fg(Color::Black));
    f.render_stateful_widget(documents_list, chunks[0], &mut app.document_list_state);

    // Editor panel
    let mut editor_block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Editor: {}", app.title));
    if app.focus == Focus::Editor {
        editor_block = editor_block.border_style(focused);
    }
    let editor_area = editor_block.inner(chunks[1]);
    f.render_widget(editor_block, chunks[1]);
    app.set_editor_area(editor_area);

    let layout = app.text_layout();
    let (start, end) = (
        app.anchor.min(app.focus_offset),
        app.anchor.max(app.focus_offset),
    );
    let lines: Vec<Line> = layout
        .rows
        .iter()
        .map(|row| {
            let prefix = match row.block {
                Some(Tag::Blockquote) => "│ ",
                _ => "",
            };
            let mut spans = vec![Span::raw(prefix)];
            spans.extend(row.cells.iter().map(|cell| {
                let mut style = run_style(&cell.tags);
                if cell.offset >= start && cell.offset < end {
                    style = style.add_modifier(Modifier::REVERSED);
                }
                Span::styled(cell.ch.to_string(), style)
            }));
            Line::from(spans)
        })
        .collect();
    f.render_widget(Paragraph::new(lines), editor_area);

    if app.focus == Focus::Editor {
        let (x, y) = layout.position_of(app.focus_offset);
        f.set_cursor_position(Position::new(editor_area.x + x, editor_area.y + y));
    }

    // Floating toolbar
    if let Some(toolbar) = app.editor.toolbar_layout() {
        let area = to_area(toolbar.bounds).intersection(f.area());
        f.render_widget(Clear, area);
        f.render_widget(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Magenta)),
            area,
        );
        let caption = Rect::new(
            toolbar.caption_origin.x as u16,
            toolbar.caption_origin.y as u16,
            area.width.saturating_sub(2),
            1,
        )
        .intersection(area);
        f.render_widget(Paragraph::new(toolbar.caption.as_str()), caption);
        for (index, button) in toolbar.buttons.iter().enumerate() {
            let label = format!("{}:{}", index + 1, short_label(button.action.tag));
            let button_area = to_area(button.rect).intersection(area);
            f.render_widget(
                Paragraph::new(label).style(Style::default().add_modifier(Modifier::REVERSED)),
                button_area,
            );
        }
    }

    // Status line
    let help = Line::from(vec![
        Span::styled(app.status.clone(), Style::default().fg(Color::Yellow)),
        Span::raw(" | Tab: Focus | Shift+←→: Select | 1-7: Format | Ctrl+S: Save | Ctrl+C: Quit"),
    ]);
    f.render_widget(Paragraph::new(help), outer[1]);
}

fn short_label(tag: WrapTag) -> &'static str {
    match tag {
        WrapTag::Strong => "B",
        WrapTag::Em => "I",
        WrapTag::U => "U",
        WrapTag::Code => "<>",
        WrapTag::H1 => "H1",
        WrapTag::H2 => "H2",
        WrapTag::Blockquote => "\"",
    }
}
