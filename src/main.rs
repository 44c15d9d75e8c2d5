use std::env;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use getopts::Options;
use walkdir::WalkDir;
use earle::bytecode::disassemble;
use earle::{CompileError, Invocation, Runtime, SetupError};
use lr::ParserKind;

fn main() {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

  let args = env::args().collect::<Vec<_>>();
  let prog = args[0].clone();
  let mut opts = Options::new();
  opts.optopt("t", "type",
    "Type of parsing table to build. Defaults to LALR.\n\
      Supported types: SLR, LALR, CLR (case insensitive)",
    "TYPE");
  opts.optopt("e", "entry", "Function to call once every file is loaded", "NAME");
  opts.optopt("", "save-table", "Write the parsing table to FILE", "FILE");
  opts.optopt("", "load-table", "Read the parsing table from FILE instead of building it", "FILE");
  opts.optflag("d", "disassemble", "Print the bytecode of every compiled function");
  opts.optflag("h", "help", "Print this message");

  let matches = match opts.parse(&args[1..]) {
    Ok(m) => m,
    Err(err) => fail(err),
  };

  if matches.opt_present("h") {
    print_usage(prog, opts);
    return;
  }

  let parser_kind = match matches.opt_str("t") {
    Some(ty) => ParserKind::from_name(&ty)
      .unwrap_or_else(|| fail(format!("unknown parser type `{}`", ty))),
    None => ParserKind::default(),
  };

  let path = if matches.free.len() == 1 {
    PathBuf::from(&matches.free[0])
  } else {
    print_usage(prog, opts);
    process::exit(1);
  };

  let table = matches.opt_str("load-table").map(|file| {
    fs::read(&file).unwrap_or_else(|err| fail(format!("cannot read {}: {}", file, err)))
  });

  let mut runtime = match Runtime::new(earle::Options { parser_kind, table }) {
    Ok(runtime) => runtime,
    Err(SetupError::Table(err)) => fail(lr::report::report(&err)),
    Err(err) => fail(err),
  };

  if let Some(file) = matches.opt_str("save-table") {
    if let Err(err) = fs::write(&file, runtime.table_bytes()) {
      fail(format!("cannot write {}: {}", file, err));
    }
  }

  let mut failed = false;
  for file in source_files(&path) {
    failed |= !load(&mut runtime, &file, matches.opt_present("d"));
  }
  if failed {
    process::exit(1);
  }

  runtime.run_until_idle();

  if let Some(entry) = matches.opt_str("e") {
    let value = match runtime.invoke(&entry, vec![]) {
      Ok(Invocation::Complete(value)) => value,
      Ok(Invocation::Pending(id)) => {
        runtime.run_until_idle();
        match runtime.take_result(id) {
          Some(Ok(value)) => value,
          Some(Err(err)) => fail(err),
          None => fail(format!("`{}` never finished", entry)),
        }
      }
      Err(err) => fail(err),
    };
    println!("{}", value);
  }
}

/// `.earle` files under `path`, or `path` itself if it is a file.
fn source_files(path: &Path) -> Vec<PathBuf> {
  if !path.is_dir() {
    return vec![path.to_owned()];
  }

  let mut files = WalkDir::new(path)
    .into_iter()
    .filter_map(|entry| match entry {
      Ok(entry) => Some(entry),
      Err(err) => {
        log::warn!("{}", err);
        None
      }
    })
    .filter(|entry| {
      entry.file_type().is_file()
        && entry.path().extension().map_or(false, |ext| ext == "earle")
    })
    .map(|entry| entry.into_path())
    .collect::<Vec<_>>();
  files.sort();
  files
}

fn load(runtime: &mut Runtime, path: &Path, show_code: bool) -> bool {
  let path = dunce::canonicalize(path).unwrap_or_else(|_| path.to_owned());
  let source = match fs::read_to_string(&path) {
    Ok(source) => source,
    Err(err) => {
      eprintln!("cannot read {}: {}", path.display(), err);
      return false;
    }
  };

  let name = path.display().to_string();
  let compiled = match runtime.compile_file(&name, &source) {
    Ok(compiled) => compiled,
    Err(CompileError::Parse(err)) => {
      eprint!("{}", lr::report::report_parse_error(&path, &source, &err));
      return false;
    }
    Err(err) => {
      match err.position() {
        Some((line, column)) => eprintln!("{}:{}:{}: {}", name, line, column, err),
        None => eprintln!("{}: {}", name, err),
      }
      return false;
    }
  };

  if show_code {
    let functions = compiled.functions.values().chain(Some(&compiled.initializer));
    for function in functions {
      match disassemble(function) {
        Ok(code) => print!("{}:\n{}\n", function.name, code),
        Err(err) => eprintln!("{}: {}", function.name, err),
      }
    }
  }
  true
}

fn fail(message: impl Display) -> ! {
  eprintln!("{}", message);
  process::exit(1);
}

fn print_usage(prog: String, opts: Options) {
  let brief = format!("Usage: {} [options] PATH", prog);
  print!("{}", opts.usage(&brief));
}
