// SPDX-FileCopyrightText: 2026 Ledgerdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `ledgerdesk console` command implementation.
//!
//! Connects to the agent, starts metrics polling and runs a readline REPL.
//! Plain input is sent to the agent as a chat message; `/`-prefixed input is
//! a console command. The transcript is printed as entries are appended, so
//! agent replies appear as they arrive.

use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use ledgerdesk_channel::{ConnectionManager, WsConnector};
use ledgerdesk_config::LedgerdeskConfig;
use ledgerdesk_conversation::{ConsoleSession, ConversationLog, Dispatched, FrameClassifier};
use ledgerdesk_core::LedgerdeskError;
use ledgerdesk_core::metrics::DataSource;
use ledgerdesk_core::types::ReminderMethod;
use ledgerdesk_metrics::{BackendClient, MetricsAggregator, PollSchedule};

use crate::overlay::{FilterMenu, Overlay, ReminderPicker, StatusFilter};
use crate::render;

/// How long shutdown waits for the polling loops to exit.
const STOP_GRACE: Duration = Duration::from_secs(2);

/// A parsed line of operator input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Say(String),
    Approve(Option<u64>),
    Generate(usize),
    Remind {
        index: usize,
        methods: Vec<ReminderMethod>,
    },
    Method(ReminderMethod),
    Send,
    Cancel,
    Dashboard,
    Overdue,
    Opportunities,
    Filter(Option<String>),
    Refresh(Option<DataSource>),
    Reconnect,
    Status,
    Transcript,
    Help,
    Quit,
}

fn parse_index(arg: Option<&&str>, usage: &str) -> Result<usize, String> {
    let arg = arg.ok_or_else(|| format!("usage: {usage}"))?;
    match arg.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("`{arg}` is not a list number; usage: {usage}")),
    }
}

fn parse_method(arg: &str) -> Result<ReminderMethod, String> {
    arg.parse::<ReminderMethod>()
        .map_err(|_| format!("unknown reminder method `{arg}` (email, whatsapp)"))
}

fn parse_source(arg: &str) -> Result<DataSource, String> {
    match arg.to_ascii_lowercase().as_str() {
        "dashboard" | "dashboard_metrics" | "metrics" => Ok(DataSource::DashboardMetrics),
        "overdue" | "overdue_invoices" => Ok(DataSource::OverdueInvoices),
        "opportunities" | "opps" | "closed_opportunities" => Ok(DataSource::ClosedOpportunities),
        other => Err(format!(
            "unknown source `{other}` (dashboard, overdue, opportunities)"
        )),
    }
}

/// Parse one input line. Blank input is `Ok(None)`; messages keep their
/// surrounding whitespace.
pub fn parse(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Ok(Some(ConsoleCommand::Say(line.to_string())));
    };

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default().to_ascii_lowercase();
    let args: Vec<&str> = parts.collect();

    let command = match name.as_str() {
        "approve" => match args.first() {
            None => ConsoleCommand::Approve(None),
            Some(arg) => ConsoleCommand::Approve(Some(
                arg.parse::<u64>()
                    .map_err(|_| format!("`{arg}` is not an entry number; usage: /approve [no.]"))?,
            )),
        },
        "generate" => ConsoleCommand::Generate(parse_index(args.first(), "/generate <no.>")?),
        "remind" => ConsoleCommand::Remind {
            index: parse_index(args.first(), "/remind <no.> [email] [whatsapp]")?,
            methods: args
                .iter()
                .skip(1)
                .map(|arg| parse_method(arg))
                .collect::<Result<_, _>>()?,
        },
        "method" => {
            let arg = args
                .first()
                .ok_or_else(|| "usage: /method <email|whatsapp>".to_string())?;
            ConsoleCommand::Method(parse_method(arg)?)
        }
        "send" => ConsoleCommand::Send,
        "cancel" => ConsoleCommand::Cancel,
        "dashboard" => ConsoleCommand::Dashboard,
        "overdue" => ConsoleCommand::Overdue,
        "opportunities" | "opps" => ConsoleCommand::Opportunities,
        "filter" => ConsoleCommand::Filter((!args.is_empty()).then(|| args.join(" "))),
        "refresh" => ConsoleCommand::Refresh(args.first().map(|a| parse_source(a)).transpose()?),
        "reconnect" => ConsoleCommand::Reconnect,
        "status" => ConsoleCommand::Status,
        "transcript" => ConsoleCommand::Transcript,
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" => ConsoleCommand::Quit,
        other => return Err(format!("unknown command /{other}; try /help")),
    };
    Ok(Some(command))
}

/// What the REPL should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Output(String),
    Error(String),
    Silent,
    Quit,
}

/// Console state: the session, the metrics it reads, and the open overlays.
pub struct Console {
    session: ConsoleSession,
    metrics: Arc<MetricsAggregator>,
    reminder: Overlay<ReminderPicker>,
    filter_menu: Overlay<FilterMenu>,
    filter: StatusFilter,
}

fn describe(result: Result<Dispatched, LedgerdeskError>) -> Step {
    match result {
        Ok(Dispatched { sent: Ok(()), .. }) => Step::Silent,
        Ok(Dispatched {
            sent: Err(e),
            sequence,
        }) => Step::Error(format!("message {sequence} was not sent: {e}")),
        Err(e) => Step::Error(e.to_string()),
    }
}

impl Console {
    pub fn new(session: ConsoleSession, metrics: Arc<MetricsAggregator>) -> Self {
        Self {
            session,
            metrics,
            reminder: Overlay::Closed,
            filter_menu: Overlay::Closed,
            filter: StatusFilter::all(),
        }
    }

    pub fn session(&self) -> &ConsoleSession {
        &self.session
    }

    pub async fn execute(&mut self, command: ConsoleCommand) -> Step {
        let dispatcher = self.session.dispatcher().clone();
        match command {
            ConsoleCommand::Say(text) => describe(dispatcher.send_user_message(&text).await),
            ConsoleCommand::Approve(sequence) => {
                let log = self.session.log();
                let preview = match sequence {
                    Some(seq) => log.find_preview(seq).ok_or_else(|| {
                        format!("entry {seq} is not an invoice preview")
                    }),
                    None => log
                        .latest_preview()
                        .map(|(_, preview)| preview)
                        .ok_or_else(|| "no invoice preview to approve".to_string()),
                };
                match preview {
                    Ok(preview) => describe(dispatcher.approve_invoice(&preview).await),
                    Err(message) => Step::Error(message),
                }
            }
            ConsoleCommand::Generate(index) => {
                let list = self.metrics.opportunities();
                let visible = self.filter.apply(&list);
                match index.checked_sub(1).and_then(|i| visible.get(i)) {
                    Some(opportunity) => describe(dispatcher.generate_invoice(opportunity).await),
                    None => Step::Error(format!(
                        "no closed opportunity {index} ({} listed)",
                        visible.len()
                    )),
                }
            }
            ConsoleCommand::Remind { index, methods } => {
                let list = self.metrics.overdue();
                let Some(invoice) = index.checked_sub(1).and_then(|i| list.get(i)).cloned() else {
                    return Step::Error(format!(
                        "no overdue invoice {index} ({} listed)",
                        list.len()
                    ));
                };
                if methods.is_empty() {
                    let picker = ReminderPicker::new(invoice);
                    let shown = render::reminder_picker(&picker);
                    self.reminder.open(picker);
                    Step::Output(shown)
                } else {
                    describe(dispatcher.send_reminder(&invoice, &methods).await)
                }
            }
            ConsoleCommand::Method(method) => match self.reminder.get_mut() {
                Some(picker) => {
                    picker.toggle(method);
                    Step::Output(render::reminder_picker(picker))
                }
                None => Step::Error("no reminder picker is open; use /remind <no.>".to_string()),
            },
            ConsoleCommand::Send => {
                let Some(picker) = self.reminder.get() else {
                    return Step::Error("nothing to send; use /remind <no.>".to_string());
                };
                if picker.methods().is_empty() {
                    return Step::Error(
                        "select at least one reminder method with /method".to_string(),
                    );
                }
                match self.reminder.dismiss() {
                    Some(picker) => {
                        describe(
                            dispatcher
                                .send_reminder(picker.invoice(), &picker.methods())
                                .await,
                        )
                    }
                    None => Step::Silent,
                }
            }
            ConsoleCommand::Cancel => {
                let closed = self.reminder.dismiss().is_some() | self.filter_menu.dismiss().is_some();
                if closed {
                    Step::Output("closed".to_string())
                } else {
                    Step::Output("nothing to cancel".to_string())
                }
            }
            ConsoleCommand::Dashboard => Step::Output(render::dashboard(&self.metrics.snapshot())),
            ConsoleCommand::Overdue => Step::Output(render::overdue_invoices(&self.metrics.overdue())),
            ConsoleCommand::Opportunities => Step::Output(render::opportunities(
                &self.metrics.opportunities(),
                &self.filter,
            )),
            ConsoleCommand::Filter(None) => {
                let menu = FilterMenu::from_opportunities(&self.metrics.opportunities());
                let shown = render::filter_menu(&menu, &self.filter);
                self.filter_menu.open(menu);
                Step::Output(shown)
            }
            ConsoleCommand::Filter(Some(choice)) => {
                let list = self.metrics.opportunities();
                let chosen = match self.filter_menu.get() {
                    Some(menu) => menu.choose(&choice),
                    None => FilterMenu::from_opportunities(&list).choose(&choice),
                };
                match chosen {
                    Some(filter) => {
                        self.filter = filter;
                        self.filter_menu.dismiss();
                        Step::Output(render::opportunities(&list, &self.filter))
                    }
                    None => Step::Error(format!("no status `{choice}` to filter by")),
                }
            }
            ConsoleCommand::Refresh(Some(source)) => match self.metrics.refresh(source).await {
                Ok(()) => Step::Output(format!("{source} refreshed")),
                Err(e) => Step::Error(e.to_string()),
            },
            ConsoleCommand::Refresh(None) => {
                let lines: Vec<String> = self
                    .metrics
                    .refresh_all()
                    .await
                    .into_iter()
                    .map(|(source, outcome)| match outcome {
                        Ok(()) => format!("{source} refreshed"),
                        Err(e) => format!("{source}: {e}"),
                    })
                    .collect();
                Step::Output(lines.join("\n"))
            }
            ConsoleCommand::Reconnect => {
                let handle = self.session.connect();
                info!(generation = handle.generation(), "operator requested reconnect");
                Step::Silent
            }
            ConsoleCommand::Status => {
                let mut lines = vec![render::connection_status(
                    &self.session.connection().status_detail(),
                    self.session.endpoint(),
                )];
                for source in DataSource::ALL {
                    lines.push(render::source_health(source, &self.metrics.health(source)));
                }
                Step::Output(lines.join("\n"))
            }
            ConsoleCommand::Transcript => {
                Step::Output(render::transcript(&self.session.log().snapshot()))
            }
            ConsoleCommand::Help => Step::Output(render::HELP.to_string()),
            ConsoleCommand::Quit => Step::Quit,
        }
    }
}

enum InputEvent {
    Line(String),
    Closed,
    Failed(String),
}

/// Read lines on a dedicated thread so the blocking editor never stalls the
/// runtime. The thread is not joined; it ends with the process.
fn spawn_input(
    prompt: String,
    history_file: Option<String>,
) -> Result<mpsc::UnboundedReceiver<InputEvent>, LedgerdeskError> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::Builder::new()
        .name("ledgerdesk-input".to_string())
        .spawn(move || {
            let mut editor = match DefaultEditor::new() {
                Ok(editor) => editor,
                Err(e) => {
                    let _ = tx.send(InputEvent::Failed(format!(
                        "failed to initialize readline: {e}"
                    )));
                    return;
                }
            };
            if let Some(path) = &history_file {
                if let Err(e) = editor.load_history(path) {
                    debug!(path = %path, error = %e, "no readline history loaded");
                }
            }
            loop {
                match editor.readline(&prompt) {
                    Ok(line) => {
                        if !line.trim().is_empty() {
                            let _ = editor.add_history_entry(line.as_str());
                            if let Some(path) = &history_file {
                                if let Err(e) = editor.save_history(path) {
                                    debug!(path = %path, error = %e, "failed to save history");
                                }
                            }
                        }
                        if tx.send(InputEvent::Line(line)).is_err() {
                            break;
                        }
                    }
                    Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                        let _ = tx.send(InputEvent::Closed);
                        break;
                    }
                    Err(e) => {
                        let _ = tx.send(InputEvent::Failed(e.to_string()));
                        break;
                    }
                }
            }
        })
        .map_err(|e| LedgerdeskError::Internal(format!("failed to start input thread: {e}")))?;
    Ok(rx)
}

fn print_step(step: &Step) {
    match step {
        Step::Output(text) if !text.is_empty() => println!("{text}"),
        Step::Error(message) => eprintln!("{}: {message}", "error".red()),
        Step::Output(_) | Step::Silent | Step::Quit => {}
    }
}

/// Runs the `ledgerdesk console` REPL until `/quit`, end of input, or
/// `cancel` fires.
pub async fn run_console(
    config: LedgerdeskConfig,
    cancel: CancellationToken,
) -> Result<(), LedgerdeskError> {
    let connection = Arc::new(ConnectionManager::new(
        Arc::new(WsConnector::new()),
        config.agent.connect_timeout(),
    ));
    let session = ConsoleSession::new(
        config.agent.endpoint.clone(),
        connection,
        FrameClassifier::new(&config.agent.origin_tag),
        ConversationLog::with_greeting(config.console.greeting.as_deref()),
    );

    let backend = Arc::new(BackendClient::new(&config.backend)?);
    let metrics = Arc::new(MetricsAggregator::new(
        backend,
        PollSchedule::from_config(&config.polling),
    ));
    metrics.start()?;
    session.connect();

    let mut console = Console::new(session, Arc::clone(&metrics));
    let mut entries = console.session().log().subscribe();
    let mut status = console.session().connection().subscribe();
    let mut awaiting = console.session().log().subscribe_awaiting_reply();
    let mut input = spawn_input(
        format!("{}> ", "ledgerdesk".green()),
        config.console.history_file.clone(),
    )?;

    println!("{}", "ledgerdesk console".bold().green());
    println!("Type a message, {} for commands, {} to exit.\n", "/help".yellow(), "/quit".yellow());

    let mut printed = 0;
    let initial = entries.borrow_and_update().clone();
    for entry in initial.iter() {
        println!("{}", render::entry(entry));
        printed += 1;
    }

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            changed = entries.changed() => {
                if changed.is_err() {
                    break;
                }
                let transcript = entries.borrow_and_update().clone();
                for entry in transcript.iter().skip(printed) {
                    println!("{}", render::entry(entry));
                }
                printed = transcript.len();
            }
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *status.borrow_and_update();
                let line = render::connection_status(&current, console.session().endpoint());
                println!("{}", line.dimmed());
            }
            changed = awaiting.changed() => {
                if changed.is_err() {
                    break;
                }
                if *awaiting.borrow_and_update() {
                    println!("{}", "agent is typing...".dimmed());
                }
            }
            event = input.recv() => match event {
                Some(InputEvent::Line(line)) => match parse(&line) {
                    Ok(Some(command)) => {
                        let step = console.execute(command).await;
                        print_step(&step);
                        if step == Step::Quit {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(message) => print_step(&Step::Error(message)),
                },
                Some(InputEvent::Failed(message)) => {
                    print_step(&Step::Error(message));
                    break;
                }
                Some(InputEvent::Closed) | None => break,
            },
        }
    }

    metrics.stop();
    console.session().disconnect();
    if tokio::time::timeout(STOP_GRACE, metrics.stopped()).await.is_err() {
        debug!("polling loops did not stop within the grace period");
    }
    info!("console exited");
    Ok(())
}
