use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use faculty_tools::assignment_sheet::{AssignmentSheet, ContractType, FasRow};
use faculty_tools::door_sign::{render_door_sign, GridLayout};
use faculty_tools::error::{ToolError, ToolResult};
use faculty_tools::pdf::{self, MergeOptions, PageNumberPosition, SourceSpec, Tag, TagSummary};
use faculty_tools::podium::{self, DayPlan};
use faculty_tools::signin::{parse_roster, render_signin, SheetMode};
use faculty_tools::syllabus::{build_syllabus_rows, parse_topics, render_syllabus_html};
use faculty_tools::{extract, ics, ToolsConfig};
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Longest focus screen or countdown, one day.
const MAX_MINUTES: i64 = 24 * 60;

/// Everyday course paperwork: assignment sheets, door signs, syllabi,
/// calendar shifting, PDF packets, the classroom podium and sign-in sheets.
#[derive(Parser, Debug)]
#[command(name = "faculty-tools", version, about, long_about = None)]
struct Cli {
    /// JSON configuration file (defaults to $FACULTY_TOOLS_CONFIG when set)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct OutputArg {
    /// Write here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert a pasted teaching schedule into Faculty Assignment Sheet rows
    Fas {
        /// Schedule text (stdin when omitted)
        input: Option<PathBuf>,
        /// BASE, EC or XXC (defaults to the configured type)
        #[arg(long)]
        contract_type: Option<String>,
        /// Print the grid instead of tab-separated rows
        #[arg(long)]
        table: bool,
        /// Edit the sheet in a prompt before exporting
        #[arg(short, long)]
        interactive: bool,
        #[command(flatten)]
        out: OutputArg,
    },

    /// Render a weekly door sign from a pasted schedule
    DoorSign {
        /// Schedule text (stdin when omitted)
        input: Option<PathBuf>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        office: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        term: Option<String>,
        /// Office hours such as "MW 2-3pm; F 10-11am"
        #[arg(long)]
        office_hours: Option<String>,
        #[arg(long)]
        slot_minutes: Option<u32>,
        #[command(flatten)]
        out: OutputArg,
    },

    /// Build a dated course schedule for a syllabus
    Syllabus {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        term: String,
        /// First day of the term (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,
        /// Last day of the term (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,
        /// Meeting days, e.g. MW, TTH, "Mon Wed Fri"
        #[arg(long)]
        days: String,
        /// One topic per line
        #[arg(long)]
        topics: Option<PathBuf>,
        /// Course calendar (.ics) whose events become due items
        #[arg(long)]
        calendar: Option<PathBuf>,
        #[command(flatten)]
        out: OutputArg,
    },

    /// Move every event in an .ics file by a number of days
    Shift {
        input: PathBuf,
        /// Days to move (negative moves earlier)
        #[arg(long, allow_hyphen_values = true, conflicts_with_all = ["from", "to"])]
        days: Option<i64>,
        /// Old term start (with --to)
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,
        /// New term start (with --from)
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
        #[command(flatten)]
        out: OutputArg,
    },

    /// Merge or tag PDF files
    Pdf {
        #[command(subcommand)]
        command: PdfCommands,
    },

    /// Classroom podium screens
    Podium {
        #[command(subcommand)]
        command: PodiumCommands,
    },

    /// Printable sign-in sheet from a pasted roster
    Signin {
        /// Roster text (stdin when omitted)
        input: Option<PathBuf>,
        #[arg(long = "class", default_value = "ENGL 1190")]
        class_name: String,
        /// Defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        /// first-week or standard
        #[arg(long, default_value = "standard")]
        mode: String,
        #[command(flatten)]
        out: OutputArg,
    },

    /// Inspect or create the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum PdfCommands {
    /// Concatenate PDFs; select pages with FILE:PAGES, e.g. notes.pdf:3,1-2
    Merge {
        #[arg(required = true)]
        inputs: Vec<String>,
        /// Prepend a table of contents
        #[arg(long)]
        toc: bool,
        /// Replace a TOC title: N=TITLE (N counts inputs from 1)
        #[arg(long = "toc-title")]
        toc_titles: Vec<String>,
        /// none, bottom-center, bottom-right, bottom-left, top-center, top-right, top-left
        #[arg(long, default_value = "none")]
        page_numbers: String,
        #[arg(long, default_value_t = 1)]
        start_number: u32,
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Suggest heading tags and write an accessible copy
    Tag {
        input: PathBuf,
        /// Override a suggestion: N=H1|H2|H3|Body (N as listed)
        #[arg(long = "set")]
        overrides: Vec<String>,
        #[arg(long, default_value = "Accessible Document")]
        title: String,
        #[arg(long, default_value = "en-US")]
        lang: String,
        /// Only print the detected lines and suggestions
        #[arg(long)]
        list: bool,
        #[arg(short, long, required_unless_present = "list")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum PodiumCommands {
    /// Welcome screen with agenda and calendar items
    Welcome {
        /// Configured class label (prefix match)
        #[arg(long = "class")]
        class_label: Option<String>,
        /// Local .ics file instead of a configured feed
        #[arg(long)]
        calendar: Option<PathBuf>,
        /// Agenda lines (\n separated)
        #[arg(long)]
        agenda: Option<String>,
        #[arg(long)]
        no_tfw: bool,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[command(flatten)]
        out: OutputArg,
    },

    /// Tech-free writing prompt with timer page
    Focus {
        #[arg(long)]
        prompt: Option<String>,
        #[arg(long, value_parser = clap::value_parser!(u32).range(..=MAX_MINUTES))]
        minutes: Option<u32>,
        #[command(flatten)]
        out: OutputArg,
    },

    /// Fuzzy countdown in the terminal
    Timer {
        #[arg(long, conflicts_with = "seconds", value_parser = clap::value_parser!(u32).range(..=MAX_MINUTES))]
        minutes: Option<u32>,
        #[arg(long)]
        seconds: Option<u32>,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Write the default configuration
    Init { path: PathBuf },
    /// Print the effective configuration
    Show,
}

fn read_input(path: Option<&Path>) -> ToolResult<String> {
    match path {
        Some(path) => Ok(fs::read_to_string(path)?),
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn write_output(out: Option<&Path>, contents: &[u8]) -> ToolResult<()> {
    match out {
        Some(path) => {
            fs::write(path, contents)?;
            info!(path = %path.display(), bytes = contents.len(), "wrote output");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(contents)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn print_fas_help() {
    println!(
        "Commands:\n  help                          Show this help\n  show                          Show the sheet\n  new                           Append an empty row\n  delete <row>                  Delete a row (rows count from 1)\n  set <row> <column> <value...> Set a cell (column prefix, e.g. room, cr, mon)\n  tsv                           Print tab-separated rows\n  save <path>                   Write tab-separated rows to a file\n  quit|exit                     Finish"
    );
}

fn parse_row(token: Option<&str>) -> Option<usize> {
    token
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .map(|n| n - 1)
}

fn run_fas_prompt(sheet: &mut AssignmentSheet) -> ToolResult<()> {
    println!("Faculty Assignment Sheet - type 'help' for commands\n");
    println!("{}", sheet.render_table());

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        io::stdout().flush()?;
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");
        match cmd {
            "help" => print_fas_help(),
            "quit" | "exit" => break,
            "show" => println!("{}", sheet.render_table()),
            "new" => match sheet.push_row(&FasRow::default()) {
                Ok(()) => println!("Added row {}.\n{}", sheet.len(), sheet.render_table()),
                Err(e) => println!("Error: {e}"),
            },
            "delete" => match parse_row(parts.next()) {
                Some(idx) => match sheet.delete_row(idx) {
                    Ok(true) => println!("Row {} deleted.\n{}", idx + 1, sheet.render_table()),
                    Ok(false) => println!("No row {}", idx + 1),
                    Err(e) => println!("Error: {e}"),
                },
                None => println!("Usage: delete <row>"),
            },
            "set" => {
                let row = parse_row(parts.next());
                let column = parts.next().map(|c| c.replace('_', " "));
                let value = parts.collect::<Vec<_>>().join(" ");
                match (row, column) {
                    (Some(idx), Some(column)) => match sheet.set_cell(idx, &column, &value) {
                        Ok(()) => println!("Cell set.\n{}", sheet.render_table()),
                        Err(e) => println!("Error: {e}"),
                    },
                    _ => println!("Usage: set <row> <column> <value...>"),
                }
            }
            "tsv" => match sheet.to_tsv() {
                Ok(tsv) => print!("{tsv}"),
                Err(e) => println!("Error: {e}"),
            },
            "save" => match parts.next() {
                Some(path) => match sheet.to_tsv().and_then(|tsv| Ok(fs::write(path, tsv)?)) {
                    Ok(()) => println!("Saved {path}"),
                    Err(e) => println!("Error: {e}"),
                },
                None => println!("Usage: save <path>"),
            },
            _ => println!("Unknown command. Type 'help'."),
        }
    }
    Ok(())
}

fn run_fas(
    config: &ToolsConfig,
    input: Option<&Path>,
    contract_type: Option<&str>,
    table: bool,
    interactive: bool,
    out: Option<&Path>,
) -> ToolResult<()> {
    let contract_type = match contract_type {
        Some(s) => s.parse::<ContractType>()?,
        None => config.default_contract_type,
    };
    let hours = config.course_hours_table();
    let mut sheet = if interactive && input.is_none() {
        AssignmentSheet::new()
    } else {
        AssignmentSheet::from_text(&read_input(input)?, contract_type, &hours)?
    };

    if sheet.is_empty() && !interactive {
        eprintln!("No classes found");
        return Ok(());
    }

    if interactive {
        run_fas_prompt(&mut sheet)?;
        if out.is_none() {
            return Ok(());
        }
    }

    let rendered = if table { sheet.render_table() } else { sheet.to_tsv()? };
    write_output(out, rendered.as_bytes())
}

fn load_event_file(path: &Path) -> ToolResult<Vec<ics::CalendarEvent>> {
    Ok(ics::events(&ics::load_calendar_file(path)?))
}

fn run_merge(
    inputs: &[String],
    toc: bool,
    toc_titles: &[String],
    page_numbers: &str,
    start_number: u32,
    output: &Path,
) -> ToolResult<()> {
    let mut sources = inputs
        .iter()
        .map(|arg| arg.parse::<SourceSpec>()?.load())
        .collect::<ToolResult<Vec<_>>>()?;
    for assignment in toc_titles {
        let (index, title) = assignment
            .split_once('=')
            .ok_or_else(|| ToolError::invalid(format!("expected N=TITLE, got '{assignment}'")))?;
        let source = index
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| sources.get_mut(i))
            .ok_or_else(|| ToolError::invalid(format!("no input number '{index}'")))?;
        source.title = title.trim().to_string();
    }

    let options = MergeOptions {
        toc,
        page_numbers: PageNumberPosition::parse_optional(page_numbers)?,
        start_number,
    };
    let merged = pdf::merge(&sources, &options)?;
    fs::write(output, &merged)?;
    println!("Merged {} files into {}", sources.len(), output.display());
    Ok(())
}

fn run_tag(
    input: &Path,
    overrides: &[String],
    title: &str,
    lang: &str,
    list: bool,
    output: Option<&Path>,
) -> ToolResult<()> {
    let bytes = fs::read(input)?;
    let mut lines = pdf::analyze_hierarchy(&bytes)?;
    for assignment in overrides {
        let (index, tag) = assignment
            .split_once('=')
            .ok_or_else(|| ToolError::invalid(format!("expected N=TAG, got '{assignment}'")))?;
        let tag: Tag = tag.parse()?;
        let line = index
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| lines.get_mut(i))
            .ok_or_else(|| ToolError::invalid(format!("no line number '{index}'")))?;
        line.tag = tag;
    }

    if list {
        for (i, line) in lines.iter().enumerate() {
            let preview: String = line.text.chars().take(70).collect();
            println!("{:>4}  p{:<3} {:<9} {:>5.1}pt  {}", i + 1, line.page, line.tag.to_string(), line.font_size, preview);
        }
    }
    println!("{}", TagSummary::from_lines(&lines));

    if let Some(output) = output {
        let tagged = pdf::tag_pdf(&bytes, &lines, title, lang)?;
        fs::write(output, tagged)?;
        println!("Wrote {}", output.display());
    }
    Ok(())
}

fn run_podium(config: &ToolsConfig, command: PodiumCommands) -> ToolResult<()> {
    let mut session = config.podium.clone();
    match command {
        PodiumCommands::Welcome {
            class_label,
            calendar,
            agenda,
            no_tfw,
            date,
            out,
        } => {
            if let Some(agenda) = agenda {
                session.agenda = agenda.replace("\\n", "\n");
            }
            if no_tfw {
                session.tech_free_writing = false;
            }
            let events = match (calendar, class_label) {
                (Some(path), _) => load_event_file(&path)?,
                (None, Some(label)) => {
                    let url = config.calendar_url(&label)?;
                    ics::fetch_events(url, config.fetch_timeout())
                }
                (None, None) => Vec::new(),
            };
            let date = date.unwrap_or_else(today);
            let (today_items, upcoming) = ics::split_today_upcoming(&events, date);
            let plan = DayPlan {
                today: today_items,
                upcoming,
            };
            let html = podium::render_welcome(&session, date, &plan);
            write_output(out.output.as_deref(), html.as_bytes())
        }
        PodiumCommands::Focus {
            prompt,
            minutes,
            out,
        } => {
            if let Some(prompt) = prompt {
                session.prompt = prompt;
            }
            if let Some(minutes) = minutes {
                session.minutes = minutes;
            }
            let html = podium::render_focus(&session)?;
            write_output(out.output.as_deref(), html.as_bytes())
        }
        PodiumCommands::Timer { minutes, seconds } => {
            if let Some(minutes) = minutes {
                session.minutes = minutes;
            }
            let total = seconds.unwrap_or_else(|| session.total_seconds());
            let mut stdout = io::stdout().lock();
            podium::run_countdown(total, &mut stdout, || thread::sleep(Duration::from_secs(1)))
        }
    }
}

fn run(cli: Cli) -> ToolResult<()> {
    let config = ToolsConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Fas {
            input,
            contract_type,
            table,
            interactive,
            out,
        } => run_fas(
            &config,
            input.as_deref(),
            contract_type.as_deref(),
            table,
            interactive,
            out.output.as_deref(),
        ),
        Commands::DoorSign {
            input,
            name,
            office,
            email,
            term,
            office_hours,
            slot_minutes,
            out,
        } => {
            let mut info = config.door_sign.clone();
            for (field, value) in [
                (&mut info.name, name),
                (&mut info.office, office),
                (&mut info.email, email),
                (&mut info.term, term),
            ] {
                if let Some(value) = value {
                    *field = value;
                }
            }
            let mut events = extract::schedule_events(&read_input(input.as_deref())?);
            if let Some(hours) = office_hours {
                events.extend(extract::office_hours(&hours));
            }
            let layout = GridLayout::fit(&events, slot_minutes.unwrap_or(config.slot_minutes));
            let html = render_door_sign(&info, &events, &layout);
            write_output(out.output.as_deref(), html.as_bytes())
        }
        Commands::Syllabus {
            title,
            term,
            start,
            end,
            days,
            topics,
            calendar,
            out,
        } => {
            if start > end {
                return Err(ToolError::invalid("term start is after term end"));
            }
            let meeting_days = extract::days_of_week(&days);
            if meeting_days.is_empty() {
                return Err(ToolError::invalid(format!("no meeting days found in '{days}'")));
            }
            let topics = match topics {
                Some(path) => parse_topics(&fs::read_to_string(path)?),
                None => Vec::new(),
            };
            let items = match calendar {
                Some(path) => ics::dated_items(&load_event_file(&path)?),
                None => Vec::new(),
            };
            let calendar = config.term_calendar(start, end, &meeting_days);
            let rows = build_syllabus_rows(&calendar, start, end, &topics, &items);
            let html = render_syllabus_html(&title, &term, &rows);
            write_output(out.output.as_deref(), html.as_bytes())
        }
        Commands::Shift {
            input,
            days,
            from,
            to,
            out,
        } => {
            let days = match (days, from, to) {
                (Some(days), _, _) => days,
                (None, Some(from), Some(to)) => ics::days_between(from, to),
                _ => return Err(ToolError::invalid("give --days or both --from and --to")),
            };
            let mut calendar = ics::load_calendar_file(&input)?;
            let summary = ics::shift_calendar(&mut calendar, days)?;
            write_output(out.output.as_deref(), ics::to_ics_string(&calendar).as_bytes())?;
            eprintln!("Shifted {} events by {days} days", summary.shifted);
            if summary.skipped > 0 {
                eprintln!("Left {} events without a start date unchanged", summary.skipped);
            }
            Ok(())
        }
        Commands::Pdf { command } => match command {
            PdfCommands::Merge {
                inputs,
                toc,
                toc_titles,
                page_numbers,
                start_number,
                output,
            } => run_merge(&inputs, toc, &toc_titles, &page_numbers, start_number, &output),
            PdfCommands::Tag {
                input,
                overrides,
                title,
                lang,
                list,
                output,
            } => run_tag(&input, &overrides, &title, &lang, list, output.as_deref()),
        },
        Commands::Podium { command } => run_podium(&config, command),
        Commands::Signin {
            input,
            class_name,
            date,
            mode,
            out,
        } => {
            let mode: SheetMode = mode.parse()?;
            let students = parse_roster(&read_input(input.as_deref())?);
            let html = render_signin(&class_name, date.unwrap_or_else(today), mode, &students);
            write_output(out.output.as_deref(), html.as_bytes())
        }
        Commands::Config { command } => match command {
            ConfigCommands::Init { path } => {
                ToolsConfig::default().save(&path)?;
                println!("Wrote default configuration to {}", path.display());
                Ok(())
            }
            ConfigCommands::Show => {
                println!("{}", config.to_json()?);
                Ok(())
            }
        },
    }
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    if let Err(err) = run(Cli::parse()) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
