//! Line-mode front end: read a command, print notices and the page.

use crate::{
    app::{App, Notice, Screen, Tone},
    commands::parse_command,
};
use anyhow::Result;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

fn print_notices(notices: &[Notice]) {
    for notice in notices {
        let label = match notice.tone {
            Tone::Info => "",
            Tone::Success => "ok: ",
            Tone::Error => "error: ",
            Tone::Alert => "! ",
        };
        for line in notice.text.lines() {
            println!("{label}{line}");
        }
    }
}

fn print_screen(screen: &Screen) {
    println!();
    println!("== {} ==", screen.title);
    for line in &screen.lines {
        println!("{line}");
    }
    println!();
}

fn prompt(app: &App) -> Result<()> {
    let who = match app.profile() {
        Some(profile) => profile.email.as_str(),
        None => "guest",
    };
    if app.awaiting_confirmation() {
        print!("{who} (yes/no)> ");
    } else {
        print!("{who}> ");
    }
    std::io::stdout().flush()?;
    Ok(())
}

/// Run until `quit` or end of input.
pub async fn run(mut app: App) -> Result<()> {
    print_notices(&app.start().await);
    app.settle_page().await;
    print_screen(&app.screen());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt(&app)?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("error: {e}");
                continue;
            }
        };
        let notices = app.handle(command).await;
        print_notices(&notices);
        if app.should_quit() {
            break;
        }

        app.settle_page().await;
        print_notices(&app.poll_session());
        print_screen(&app.screen());
    }
    Ok(())
}
