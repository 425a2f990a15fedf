//! Exam command implementation.

use std::io::{BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::{Args, Subcommand};
use colored::Colorize;
use tokio::sync::mpsc;

use quizgate_core::{AnswerChoice, ExamStatus, Question, TestId};
use quizgate_session::{ExamSession, SubmitOutcome};

use crate::output;
use crate::session::CliSession;

#[derive(Args, Debug)]
pub struct ExamCommand {
    #[command(subcommand)]
    pub command: ExamSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum ExamSubcommand {
    /// Take a test interactively
    Take(TakeArgs),
}

/// One week.
const MAX_MINUTES: u64 = 7 * 24 * 60;

#[derive(Args, Debug)]
pub struct TakeArgs {
    /// Id of the test to take
    pub test_id: TestId,

    /// Time limit in minutes; the answers are submitted when it runs out
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=MAX_MINUTES))]
    pub minutes: Option<u64>,
}

pub async fn handle(session: &CliSession, cmd: ExamCommand) -> Result<()> {
    match cmd.command {
        ExamSubcommand::Take(args) => take(session, args).await,
    }
}

/// One line typed during an attempt.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    /// Question number (1-based) and option index (0-based).
    Select { question: usize, option: usize },
    Submit,
    Quit,
    Show,
    Help,
    Empty,
}

fn parse_input(line: &str) -> Result<Input, String> {
    let mut words = line.split_whitespace();
    let Some(first) = words.next() else {
        return Ok(Input::Empty);
    };

    let input = match first.to_ascii_lowercase().as_str() {
        "submit" => Input::Submit,
        "quit" | "exit" => Input::Quit,
        "show" | "list" => Input::Show,
        "help" | "?" => Input::Help,
        number => {
            let question = number
                .parse::<usize>()
                .map_err(|_| format!("Unknown command '{}'", first))?;
            let option = words
                .next()
                .ok_or_else(|| format!("Which option for question {}?", question))?;
            Input::Select {
                question,
                option: parse_option(option)?,
            }
        }
    };

    match words.next() {
        Some(extra) => Err(format!("Unexpected '{}'", extra)),
        None => Ok(input),
    }
}

/// Options are typed as a letter (`b`) or a 1-based number (`2`).
fn parse_option(word: &str) -> Result<usize, String> {
    if let Ok(n) = word.parse::<usize>() {
        return n
            .checked_sub(1)
            .ok_or_else(|| "Options are numbered from 1".to_string());
    }
    match word.as_bytes() {
        [c] if c.is_ascii_alphabetic() => Ok(usize::from(c.to_ascii_lowercase() - b'a')),
        _ => Err(format!("'{}' is not an option", word)),
    }
}

fn option_letter(index: usize) -> char {
    u8::try_from(index)
        .ok()
        .filter(|i| *i < 26)
        .map_or('?', |i| char::from(b'a' + i))
}

async fn take(session: &CliSession, args: TakeArgs) -> Result<()> {
    session.require_login().await?;

    output::note("Starting test...");
    let duration = args.minutes.map(|m| Duration::from_secs(m * 60));
    let exam = ExamSession::start(Arc::new(session.assessment()), args.test_id, duration)
        .await
        .context("Failed to start test")?;

    output::success(&format!(
        "Test started at {}",
        exam.started_at().with_timezone(&Local).format("%H:%M:%S")
    ));
    println!();
    print_questions(&exam);
    print_help();

    let mut input = spawn_input();
    let mut status = exam.subscribe();

    loop {
        prompt(&exam);
        tokio::select! {
            changed = status.changed() => {
                if changed.is_err() {
                    bail!("Exam session closed");
                }
                let current = *status.borrow_and_update();
                match current {
                    ExamStatus::Submitting => {
                        println!();
                        output::note("Time is up, submitting your answers...");
                    }
                    ExamStatus::Submitted => {
                        print_result(&exam);
                        return Ok(());
                    }
                    ExamStatus::Expired => bail!("Session expired, please log in again"),
                    ExamStatus::Active => {
                        if let Some(error) = exam.last_error() {
                            output::error(&format!("{}. Type 'submit' to retry.", error));
                        }
                    }
                }
            }
            line = input.recv() => {
                let Some(line) = line else {
                    exam.abandon();
                    output::note("Input closed, attempt abandoned");
                    return Ok(());
                };

                match parse_input(&line) {
                    Ok(Input::Select { question, option }) => select(&exam, question, option),
                    Ok(Input::Submit) => {
                        match exam.submit().await {
                            Ok(SubmitOutcome::Submitted(_)) => {
                                print_result(&exam);
                                return Ok(());
                            }
                            Ok(SubmitOutcome::Ignored(current)) => {
                                output::note(&format!("Attempt is {}", current));
                            }
                            Err(e) if e.requires_login() => {
                                return Err(e).context("Failed to submit answers");
                            }
                            Err(e) => {
                                output::error(&format!("{}. Type 'submit' to retry.", e));
                                // Already reported; skip the status change it caused.
                                drop(status.borrow_and_update());
                            }
                        }
                    }
                    Ok(Input::Quit) => {
                        exam.abandon();
                        output::note("Attempt abandoned");
                        return Ok(());
                    }
                    Ok(Input::Show) => print_questions(&exam),
                    Ok(Input::Help) => print_help(),
                    Ok(Input::Empty) => {}
                    Err(message) => output::error(&message),
                }
            }
        }
    }
}

/// Read stdin lines on a plain thread so a pending read never holds up
/// runtime shutdown.
fn spawn_input() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn select(exam: &ExamSession, number: usize, option: usize) {
    let questions = exam.questions();
    let Some(question) = number.checked_sub(1).and_then(|i| questions.get(i)) else {
        output::error(&format!("There is no question {}", number));
        return;
    };

    match exam.select_answer(&question.id, AnswerChoice::Index(option)) {
        Ok(()) => output::success(&format!(
            "Question {}: {}",
            number,
            describe(question, &AnswerChoice::Index(option))
        )),
        Err(e) => output::error(&e.to_string()),
    }
}

fn prompt(exam: &ExamSession) {
    let answered = exam.answers().len();
    let total = exam.questions().len();
    let clock = match exam.remaining() {
        Some(left) => format!("{:02}:{:02} left, ", left.as_secs() / 60, left.as_secs() % 60),
        None => String::new(),
    };
    print!("[{}{}/{} answered] > ", clock, answered, total);
    let _ = std::io::stdout().flush();
}

fn print_questions(exam: &ExamSession) {
    let answers = exam.answers();
    for (n, question) in exam.questions().iter().enumerate() {
        println!("{}. {}", n + 1, question.text.bold());
        for (i, option) in question.options.iter().enumerate() {
            let picked = answers.get(&question.id) == Some(&AnswerChoice::Index(i));
            let marker = if picked { "*" } else { " " };
            println!("   {}{}) {}", marker, option_letter(i), option);
        }
    }
    println!();
}

fn print_help() {
    output::note("Type '<question> <option>' to answer (e.g. '2 b'), 'show' to list the");
    output::note("questions again, 'submit' to finish or 'quit' to abandon.");
}

fn describe(question: &Question, choice: &AnswerChoice) -> String {
    match choice {
        AnswerChoice::Index(i) => match question.options.get(*i) {
            Some(text) => format!("{}) {}", option_letter(*i), text),
            None => format!("option {}", i + 1),
        },
        AnswerChoice::Label(label) => label.clone(),
    }
}

fn print_result(exam: &ExamSession) {
    let Some(result) = exam.result() else {
        return;
    };

    println!();
    output::success("Test submitted");
    output::field("Score", &format!("{}/{}", result.score, result.max_score));
    if let Some(percentage) = result.percentage() {
        output::field("Percentage", &format!("{:.1}%", percentage));
    }
    println!();

    let answers = exam.answers();
    for (n, question) in exam.questions().iter().enumerate() {
        let picked = answers.get(&question.id);
        let mark = match (picked, question.correct_option()) {
            (Some(picked), Some(correct)) if picked == correct => "✓".green(),
            (_, Some(_)) => "✗".red(),
            _ => "·".dimmed(),
        };
        println!("{} {}. {}", mark, n + 1, question.text);
        if let Some(picked) = picked {
            println!("     your answer: {}", describe(question, picked));
        }
        if let Some(correct) = question.correct_option() {
            println!("     correct:     {}", describe(question, correct));
        }
    }
}
