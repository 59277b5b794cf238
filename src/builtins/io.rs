// ABOUTME: I/O builtins: string and file streams, console printing, file
// system operations, process execution and dynamic script loading

use crate::environment::Environment;
use crate::errors::RuntimeError;
use crate::io::{InputHandle, OutputHandle};
use crate::values::{Args, ObjectValue, Value, ValueData};

define_native! {
    func_str_input,
    name: "str_input",
    params: ["str"],
    info: "str_input(str)\n\nReturns an input object that reads the characters of the given string.\n\n: str_input('abc') ==> <!input-stream>",
    |args, _env, _pos| {
        Ok(Value::input(InputHandle::from_string(
            &args.get_string("str")?,
        )))
    }
}

define_native! {
    func_str_output,
    name: "str_output",
    params: [],
    info: "str_output()\n\nReturns an output object collecting into a string. The collected text\ncan be retrieved using get_output_string.",
    |_args, _env, _pos| {
        Ok(Value::output(OutputHandle::string_output()))
    }
}

define_native! {
    func_file_input,
    name: "file_input",
    params: ["filename", "encoding"],
    secure: false,
    info: "file_input(filename, encoding = 'UTF-8')\n\nReturns an input object that reads the characters from the given file.",
    |args, _env, pos| {
        let filename = args.get_string("filename")?;
        InputHandle::from_file(&filename)
            .map(Value::input)
            .map_err(|_| RuntimeError::new(format!("Cannot open file {}", filename), pos))
    }
}

define_native! {
    func_file_output,
    name: "file_output",
    params: ["filename", "encoding", "append"],
    secure: false,
    info: "file_output(filename, encoding = 'UTF-8', append = FALSE)\n\nReturns an output object that writes to the given file. If the file\nexists it is overwritten.",
    |args, _env, pos| {
        let filename = args.get_string("filename")?;
        let append = if args.has_arg("append") {
            args.get_as_boolean("append")?
        } else {
            false
        };
        OutputHandle::file(&filename, append)
            .map(Value::output)
            .map_err(|_| RuntimeError::new(format!("Cannot open file {}", filename), pos))
    }
}

define_native! {
    func_file_copy,
    name: "file_copy",
    params: ["src", "dest"],
    secure: false,
    info: "file_copy(src, dest)\n\nCopies the specified file.",
    |args, _env, pos| {
        let src = args.get_string("src")?;
        let dest = args.get_string("dest")?;
        std::fs::copy(&src, &dest)
            .map_err(|_| RuntimeError::new(format!("Cannot copy file {}", src), pos))?;
        Ok(Value::null())
    }
}

define_native! {
    func_file_move,
    name: "file_move",
    params: ["src", "dest"],
    secure: false,
    info: "file_move(src, dest)\n\nMoves the specified file.",
    |args, _env, pos| {
        let src = args.get_string("src")?;
        let dest = args.get_string("dest")?;
        std::fs::rename(&src, &dest)
            .map_err(|_| RuntimeError::new(format!("Cannot move file {}", src), pos))?;
        Ok(Value::null())
    }
}

define_native! {
    func_file_delete,
    name: "file_delete",
    params: ["filename"],
    secure: false,
    info: "file_delete(filename)\n\nDeletes the specified file.",
    |args, _env, pos| {
        let filename = args.get_string("filename")?;
        let path = std::path::Path::new(&filename);
        let result = if path.is_dir() {
            std::fs::remove_dir(path)
        } else {
            std::fs::remove_file(path)
        };
        result.map_err(|_| {
            RuntimeError::new(format!("Cannot delete file {}", filename), pos)
        })?;
        Ok(Value::null())
    }
}

define_native! {
    func_file_exists,
    name: "file_exists",
    params: ["filename"],
    secure: false,
    info: "file_exists(filename)\n\nReturns TRUE if the specified file exists.",
    |args, _env, _pos| {
        let filename = args.get_string("filename")?;
        Ok(Value::boolean(std::path::Path::new(&filename).exists()))
    }
}

define_native! {
    func_file_info,
    name: "file_info",
    params: ["filename"],
    secure: false,
    info: "file_info(filename)\n\nReturns information about the specified file (size, is_dir, modified).",
    |args, _env, _pos| {
        let filename = args.get_string("filename")?;
        let path = std::path::Path::new(&filename);
        let Ok(metadata) = std::fs::metadata(path) else {
            return Ok(Value::null());
        };
        let mut result = ObjectValue::new();
        result
            .members
            .insert("size".to_string(), Value::int(metadata.len() as i64));
        result
            .members
            .insert("is_dir".to_string(), Value::boolean(metadata.is_dir()));
        if let Ok(modified) = metadata.modified() {
            if let Ok(elapsed) = modified.duration_since(std::time::UNIX_EPOCH) {
                if let Some(date) = crate::dates::from_timestamp(elapsed.as_secs_f64()) {
                    result.members.insert("modified".to_string(), Value::date(date));
                }
            }
        }
        Ok(Value::object(result))
    }
}

define_native! {
    func_list_dir,
    name: "list_dir",
    params: ["dir", "recursive", "include_path", "include_dirs"],
    secure: false,
    info: "list_dir(dir, recursive = FALSE, include_path = FALSE, include_dirs = FALSE)\n\nEnumerates the files and directories in the specified directory and\nreturns a list of filenames or paths.",
    |args, _env, pos| {
        let dir = args.get_string("dir")?;
        let recursive = args.get_boolean_or("recursive", false)?;
        let include_path = args.get_boolean_or("include_path", recursive)?;
        let include_dirs = args.get_boolean_or("include_dirs", false)?;
        let mut result = Vec::new();
        collect_files(
            std::path::Path::new(&dir),
            recursive,
            include_path,
            include_dirs,
            &mut result,
        )
        .map_err(|_| RuntimeError::new(format!("Cannot list directory {}", dir), pos))?;
        Ok(Value::list(result))
    }
}

fn collect_files(
    dir: &std::path::Path,
    recursive: bool,
    include_path: bool,
    include_dirs: bool,
    result: &mut Vec<Value>,
) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_dir = path.is_dir();
        if include_dirs || !is_dir {
            let name = if include_path {
                path.to_string_lossy().to_string()
            } else {
                entry.file_name().to_string_lossy().to_string()
            };
            result.push(Value::string(name));
        }
        if recursive && is_dir {
            collect_files(&path, recursive, include_path, include_dirs, result)?;
        }
    }
    Ok(())
}

define_native! {
    func_make_dir,
    name: "make_dir",
    params: ["dir", "with_parents"],
    secure: false,
    info: "make_dir(dir, with_parents = FALSE)\n\nCreates a directory.",
    |args, _env, pos| {
        let dir = args.get_string("dir")?;
        let with_parents = args.get_boolean_or("with_parents", false)?;
        let result = if with_parents {
            std::fs::create_dir_all(&dir)
        } else {
            std::fs::create_dir(&dir)
        };
        result.map_err(|_| {
            RuntimeError::new(format!("Cannot create directory {}", dir), pos)
        })?;
        Ok(Value::null())
    }
}

define_native! {
    func_close,
    name: "close",
    params: ["conn"],
    info: "close(conn)\n\nCloses the input or output connection and releases system resources.\nClosing twice is a no-op.",
    |args, _env, pos| {
        let conn = args.get("conn")?;
        match &conn.data {
            ValueData::Input(input) => {
                input.borrow_mut().close();
                Ok(Value::null())
            }
            ValueData::Output(output) => {
                output.borrow_mut().close();
                Ok(Value::null())
            }
            _ => Err(RuntimeError::new(
                format!("Cannot close {}", conn.type_name()),
                pos,
            )),
        }
    }
}

define_native! {
    func_read,
    name: "read",
    params: ["input"],
    info: "read(input = stdin)\n\nReads a single character from the input, NULL at end of input.\n\n: def s = str_input('hello'); read(s) ==> 'h'",
    |args, env, pos| {
        let input = args.get_input_or("input", env.get("stdin", pos)?)?;
        let result = input.borrow_mut().read();
        match result {
            Some(ch) => Ok(Value::string(ch)),
            None => Ok(Value::null()),
        }
    }
}

define_native! {
    func_read_all,
    name: "read_all",
    params: ["input"],
    info: "read_all(input = stdin)\n\nReads the whole input, NULL at end of input.\n\n: def s = str_input('hello'); read_all(s) ==> 'hello'",
    |args, env, pos| {
        let input = args.get_input_or("input", env.get("stdin", pos)?)?;
        let result = input.borrow_mut().read_all();
        match result {
            Some(text) => Ok(Value::string(text)),
            None => Ok(Value::null()),
        }
    }
}

define_native! {
    func_readln,
    name: "readln",
    params: ["input"],
    info: "readln(input = stdin)\n\nReads one line from the input, NULL at end of input.\n\n: def s = str_input('hello'); readln(s) ==> 'hello'",
    |args, env, pos| {
        let input = args.get_input_or("input", env.get("stdin", pos)?)?;
        let result = input.borrow_mut().read_line();
        match result {
            Some(line) => Ok(Value::string(line)),
            None => Ok(Value::null()),
        }
    }
}

define_native! {
    func_print,
    name: "print",
    params: ["obj", "out"],
    info: "print(obj, out = stdout)\n\nPrints the obj to the output out.\n\n: print('hello') ==> NULL",
    |args, env, pos| {
        let obj = args.get_as_string("obj")?;
        let output = args.get_output_or("out", env.get("stdout", pos)?)?;
        output
            .borrow_mut()
            .write(&obj)
            .map_err(|_| RuntimeError::new("Cannot write to output", pos))?;
        Ok(Value::null())
    }
}

define_native! {
    func_println,
    name: "println",
    params: ["obj", "out"],
    info: "println(obj = '', out = stdout)\n\nPrints the obj to the output out and terminates the line.\n\n: println('hello') ==> NULL",
    |args, env, pos| {
        let obj = if args.has_arg("obj") {
            args.get_as_string("obj")?
        } else {
            String::new()
        };
        let output = args.get_output_or("out", env.get("stdout", pos)?)?;
        output
            .borrow_mut()
            .write_line(&obj)
            .map_err(|_| RuntimeError::new("Cannot write to output", pos))?;
        Ok(Value::null())
    }
}

define_native! {
    func_process_lines,
    name: "process_lines",
    params: ["input", "callback"],
    info: "process_lines(input, callback)\n\nReads lines from the input and calls the callback function once for\neach line. If input is a list, each element is processed as a line.\nReturns the number of processed lines.",
    |args, env, pos| {
        let source = args.get("input")?;
        let callback = args.get("callback")?.as_func().map_err(|e| e.at(pos))?;
        let call_env = Environment::with_parent(env);
        let arg_names = callback.arg_names();
        let param = arg_names
            .first()
            .ok_or_else(|| RuntimeError::new("Callback needs one argument", pos))?;
        let mut count: i64 = 0;
        match &source.data {
            ValueData::Input(input) => {
                loop {
                    let line = input.borrow_mut().read_line();
                    let Some(line) = line else {
                        break;
                    };
                    let mut call_args = Args::new(pos);
                    call_args.add_arg(param, Value::string(line));
                    crate::eval::execute_func(&callback, &call_args, &call_env, pos)?;
                    count += 1;
                }
                Ok(Value::int(count))
            }
            ValueData::List(items) => {
                let lines = items.borrow().clone();
                for element in lines {
                    let mut call_args = Args::new(pos);
                    call_args.add_arg(param, Value::string(element.as_string()?));
                    crate::eval::execute_func(&callback, &call_args, &call_env, pos)?;
                    count += 1;
                }
                Ok(Value::int(count))
            }
            _ => Err(RuntimeError::new(
                format!("Cannot process lines from {}", source.type_name()),
                pos,
            )),
        }
    }
}

define_native! {
    func_get_output_string,
    name: "get_output_string",
    params: ["output"],
    info: "get_output_string(output)\n\nReturns the value of a string output object.\n\n: do def o = str_output(); print('abc', out = o); get_output_string(o); end ==> 'abc'",
    |args, _env, pos| {
        let output = args.get_output_or("output", Value::null())?;
        let value = output.borrow().string_value();
        value
            .map(Value::string)
            .ok_or_else(|| RuntimeError::new("Not a string output", pos))
    }
}

define_native! {
    func_execute,
    name: "execute",
    params: ["program", "args", "work_dir", "echo", "output_file"],
    secure: false,
    info: "execute(program, args, work_dir = NULL, echo = FALSE, output_file = NULL)\n\nExecutes the program with the arguments in the list args and returns\nthe exit code.",
    |args, _env, pos| {
        let program = args.get_string("program")?;
        let arglist = args.get("args")?;
        let ValueData::List(items) = &arglist.data else {
            return Err(RuntimeError::new(
                format!("Expected argument list but got {}", arglist.type_name()),
                pos,
            ));
        };
        let mut command_args: Vec<String> = Vec::new();
        for arg in items.borrow().iter() {
            command_args.push(arg.as_string()?);
        }
        let mut command = std::process::Command::new(&program);
        command.args(&command_args);
        if args.has_arg("work_dir") && !args.is_null("work_dir") {
            command.current_dir(args.get_string("work_dir")?);
        }
        if args.get_boolean_or("echo", false)? {
            println!("{} {}", program, command_args.join(" "));
        }
        let output_file = if args.has_arg("output_file") && !args.is_null("output_file") {
            Some(args.get_string("output_file")?)
        } else {
            None
        };
        if let Some(output_file) = output_file {
            let output = command
                .output()
                .map_err(|_| RuntimeError::new(format!("Cannot execute {}", program), pos))?;
            std::fs::write(&output_file, &output.stdout).map_err(|_| {
                RuntimeError::new(format!("Cannot write to file {}", output_file), pos)
            })?;
            Ok(Value::int(output.status.code().unwrap_or(-1) as i64))
        } else {
            let status = command
                .status()
                .map_err(|_| RuntimeError::new(format!("Cannot execute {}", program), pos))?;
            Ok(Value::int(status.code().unwrap_or(-1) as i64))
        }
    }
}

define_native! {
    func_run,
    name: "run",
    params: ["file"],
    secure: false,
    info: "run(file)\n\nLoads and interprets the file.",
    |args, env, pos| {
        let file = args.get_string("file")?;
        let script = std::fs::read_to_string(&file)
            .map_err(|_| RuntimeError::new(format!("File {} not found", file), pos))?;
        let node = crate::parser::parse_script(&script, &file)
            .map_err(|e| RuntimeError::new(e.msg, pos))?;
        let result = node.evaluate(env)?;
        match result.data {
            ValueData::Return(value, _) => Ok(*value),
            _ => Ok(result),
        }
    }
}

define_native! {
    func_get_env,
    name: "get_env",
    params: ["var"],
    info: "get_env(var)\n\nReturns the value of the environment variable var.",
    |args, _env, _pos| {
        let var = args.get_string("var")?;
        Ok(Value::string(std::env::var(&var).unwrap_or_default()))
    }
}
