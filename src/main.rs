use std::{
    env,
    io::{self, BufRead, Write},
    path::PathBuf,
    process::ExitCode,
    time::Instant,
};

use docs_finder::{
    evaluation::load_judgements, EngineConfig, Evaluator, Result, RetrievalEngine, ScoredDocument,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

enum Command {
    Train { corpus: PathBuf },
    Query { text: Option<String>, good: Vec<usize>, bad: Vec<usize> },
    Eval { judgements: PathBuf },
}

struct Args {
    command: Command,
    config: Option<PathBuf>,
    model: Option<PathBuf>,
    top: Option<usize>,
}

fn print_usage() {
    eprintln!("Usage: docs-finder [--config FILE] [--model PATH] <command>");
    eprintln!("  train <corpus.json>                       train and save the model");
    eprintln!("  query [TEXT] [--top N] [--good I].. [--bad I]..");
    eprintln!("                                            rank documents; reads stdin if TEXT omitted");
    eprintln!("  eval <judgements.json> [--top N]          mean average precision and recall");
    eprintln!("Output format: <score>\\t<index>\\t<id>\\t<title>");
}

fn parse_index(flag: &str, value: Option<String>) -> std::result::Result<usize, String> {
    let value = value.ok_or_else(|| format!("{flag} requires a number"))?;
    value.parse::<usize>().map_err(|_| format!("{flag} needs a non-negative integer, got {value:?}"))
}

fn parse_args() -> std::result::Result<Option<Args>, String> {
    let mut args = env::args().skip(1);
    let mut config = None;
    let mut model = None;
    let mut top = None;
    let mut good = Vec::new();
    let mut bad = Vec::new();
    let mut positional: Vec<String> = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config = Some(PathBuf::from(args.next().ok_or("--config requires a path")?)),
            "--model" => model = Some(PathBuf::from(args.next().ok_or("--model requires a path")?)),
            "--top" => match parse_index("--top", args.next())? {
                0 => return Err("--top needs a positive integer".into()),
                n => top = Some(n),
            },
            "--good" => good.push(parse_index("--good", args.next())?),
            "--bad" => bad.push(parse_index("--bad", args.next())?),
            "-h" | "--help" => return Ok(None),
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let command = match positional.next().as_deref() {
        Some("train") => Command::Train {
            corpus: positional.next().map(PathBuf::from).ok_or("train requires a corpus file")?,
        },
        Some("query") => {
            let words: Vec<String> = positional.by_ref().collect();
            let text = (!words.is_empty()).then(|| words.join(" "));
            Command::Query { text, good, bad }
        }
        Some("eval") => Command::Eval {
            judgements: positional.next().map(PathBuf::from).ok_or("eval requires a judgements file")?,
        },
        Some(other) => return Err(format!("unknown command {other:?}")),
        None => return Ok(None),
    };
    if let Some(extra) = positional.next() {
        return Err(format!("unexpected argument {extra:?}"));
    }
    Ok(Some(Args { command, config, model, top }))
}

fn print_hits(hits: &[ScoredDocument]) {
    for hit in hits {
        println!("{:.6}\t{}\t{}\t{}", hit.relevancy, hit.index, hit.document.id, hit.document.title.trim());
    }
}

fn run_query(engine: &RetrievalEngine, text: &str, good: &[usize], bad: &[usize], top: usize) -> Result<()> {
    let t0 = Instant::now();
    let hits = if good.is_empty() && bad.is_empty() {
        engine.find(text, top)?
    } else {
        engine.find_with_feedback(text, good, bad, top)?
    };
    info!(elapsed_ms = t0.elapsed().as_secs_f64() * 1000.0, "query done");
    print_hits(&hits);
    Ok(())
}

fn run_interactive(engine: &RetrievalEngine, top: usize) -> Result<()> {
    query_loop(engine, top, io::stdin().lock(), &mut io::stdout())
}

/// Prompt on `prompt`, read queries from `input` until EOF, a blank line or `exit`
fn query_loop<R, W>(engine: &RetrievalEngine, top: usize, mut input: R, prompt: &mut W) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    loop {
        if let Err(e) = write!(prompt, "Query> ").and_then(|_| prompt.flush()) {
            error!(error = %e, "write error");
            break;
        }
        let mut line = String::new();
        match input.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                error!(error = %e, "read error");
                break;
            }
        }
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
            break;
        }
        run_query(engine, trimmed, &[], &[], top)?;
    }
    Ok(())
}

fn run(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::default(),
    }
    .with_env_overrides()?;
    if let Some(model) = args.model {
        config = config.with_model_path(model);
    }
    let top = args.top.unwrap_or(config.default_top);
    let engine = RetrievalEngine::new(config);

    match args.command {
        Command::Train { corpus } => {
            let report = engine.train_from_path(&corpus)?;
            info!(accepted = report.accepted, skipped = report.rejected.len(), "training finished");
            engine.save()
        }
        Command::Query { text, good, bad } => {
            engine.load()?;
            match text {
                Some(text) => run_query(&engine, &text, &good, &bad, top),
                None => run_interactive(&engine, top),
            }
        }
        Command::Eval { judgements } => {
            engine.load()?;
            let judgements = load_judgements(&judgements)?;
            let report = Evaluator::new(&engine, top).report(&judgements)?;
            for q in &report.queries {
                println!("{}\tprecision={:.4}\trecall={:.4}", q.id, q.precision, q.recall);
            }
            println!("mean\tprecision={:.4}\trecall={:.4}", report.precision, report.recall);
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let args = match parse_args() {
        Ok(Some(args)) => args,
        Ok(None) => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        Err(msg) => {
            error!("{msg}");
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    let program_start = Instant::now();
    let result = run(args);
    info!(elapsed_ms = program_start.elapsed().as_secs_f64() * 1000.0, "program finished");
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "failed");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }
    }

    fn engine() -> RetrievalEngine {
        let engine = RetrievalEngine::new(EngineConfig::default());
        engine
            .train(&[
                json!({"id": "1", "title": "", "content": "cat dog"}),
                json!({"id": "2", "title": "", "content": "dog bird"}),
            ])
            .unwrap();
        engine
    }

    #[test]
    fn query_loop_prompts_until_exit() {
        let engine = engine();
        let mut input: &[u8] = b"cat\nexit\ndog\n";
        let mut prompt = Vec::new();
        query_loop(&engine, 2, &mut input, &mut prompt).unwrap();
        assert_eq!(String::from_utf8(prompt).unwrap(), "Query> Query> ");
        assert_eq!(input, b"dog\n");
    }

    #[test]
    fn query_loop_stops_when_prompt_cannot_be_written() {
        let engine = engine();
        let mut input: &[u8] = b"cat\n";
        query_loop(&engine, 2, &mut input, &mut BrokenPipe).unwrap();
        // nothing read after the failed prompt
        assert_eq!(input, b"cat\n");
    }
}
