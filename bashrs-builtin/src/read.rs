// This file is part of bashrs, a Bash-compatible shell interpreter.

//! `read`: reads one line from fd 0 and splits it across the named
//! variables, the trailing one absorbing whatever words are left over.
//!
//! Grounded on yash-builtin's `read` module; simplified to whitespace
//! splitting rather than consulting `$IFS` character by character.

use bashrs_env::fd::FdBody;
use bashrs_env::variable::Variable;
use bashrs_env::Session;
use std::io::BufRead;

pub fn run(session: &mut Session, argv: &[String]) -> i32 {
    let mut names: Vec<String> = Vec::new();
    for arg in &argv[1..] {
        if arg == "-r" {
            continue;
        }
        names.push(arg.clone());
    }
    if names.is_empty() {
        names.push("REPLY".to_string());
    }

    let mut line = String::new();
    let read_result = match session.fds.get(0) {
        Some(FdBody::File(file)) => std::io::BufReader::new(&**file).read_line(&mut line),
        _ => std::io::stdin().lock().read_line(&mut line),
    };
    match read_result {
        Ok(0) => return 1,
        Ok(_) => {}
        Err(_) => return 1,
    }
    while matches!(line.chars().last(), Some('\n') | Some('\r')) {
        line.pop();
    }

    let fields: Vec<&str> = line.split_whitespace().collect();
    let last = names.len() - 1;
    for (i, name) in names.iter().enumerate() {
        let value = if i == last {
            fields.get(i..).map(|rest| rest.join(" ")).unwrap_or_default()
        } else {
            fields.get(i).map(|s| s.to_string()).unwrap_or_default()
        };
        session.variables.assign(name, Variable::new(value));
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn splits_line_across_named_variables() {
        let mut s = Session::new("test", std::env::temp_dir());
        let mut file = tempfile::tempfile().unwrap();
        std::io::Write::write_all(&mut file, b"alpha beta gamma delta\n").unwrap();
        std::io::Seek::seek(&mut file, std::io::SeekFrom::Start(0)).unwrap();
        s.fds.set(0, FdBody::File(Rc::new(file)));
        let status = run(&mut s, &["read".to_string(), "a".to_string(), "b".to_string(), "rest".to_string()]);
        assert_eq!(status, 0);
        assert_eq!(s.variables.get("a").unwrap().value.as_scalar(), "alpha");
        assert_eq!(s.variables.get("b").unwrap().value.as_scalar(), "beta");
        assert_eq!(s.variables.get("rest").unwrap().value.as_scalar(), "gamma delta");
    }
}
