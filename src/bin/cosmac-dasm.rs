use cosmac_dasm::annotations::Annotations;
use cosmac_dasm::{Disassembler, MemoryImage, OutputOptions, WriteSink};
use log::{debug, info};
use std::env;
use std::fs::File;
use std::io::{self, BufWriter, Write};

fn print_usage(program: &str) {
    eprintln!("Usage: {} [options] <image>", program);
    eprintln!("\nOptions:");
    eprintln!("  -a, --annotations FILE  TOML file of code/data areas and labels");
    eprintln!("  -b, --base ADDR         Treat the image as raw binary loaded at ADDR");
    eprintln!("                          (default: Intel HEX)");
    eprintln!("  -o, --output FILE       Write the listing to FILE instead of stdout");
    eprintln!("  -w, --width N           Wrap data lines past N characters (default 48)");
    eprintln!("  -n                      Show the address of each line");
    eprintln!("  -d                      Dump hex bytes of instructions");
    eprintln!("  -h, --help              Show this help message");
}

fn parse_number(text: &str) -> Result<u32, String> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => text.parse::<u32>(),
    };
    parsed.map_err(|_| format!("Invalid number: {}", text))
}

fn option_value<'a>(args: &'a [String], i: usize) -> Result<&'a str, String> {
    args.get(i + 1)
        .map(String::as_str)
        .ok_or_else(|| format!("Option {} needs a value", args[i]))
}

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().collect();
    if let Err(e) = run(&args) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let mut annotation_file = None;
    let mut base = None;
    let mut output_file = None;
    let mut options = OutputOptions::default();
    let mut filename = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-a" | "--annotations" => {
                annotation_file = Some(option_value(args, i)?.to_string());
                i += 1;
            }
            "-b" | "--base" => {
                let value = parse_number(option_value(args, i)?)?;
                let value = u16::try_from(value)
                    .map_err(|_| format!("Base address {:#x} is out of range", value))?;
                base = Some(value);
                i += 1;
            }
            "-o" | "--output" => {
                output_file = Some(option_value(args, i)?.to_string());
                i += 1;
            }
            "-w" | "--width" => {
                options.data_line_width = parse_number(option_value(args, i)?)? as usize;
                i += 1;
            }
            "-n" => options.show_addresses = true,
            "-d" => options.dump_hex = true,
            "-h" | "--help" => {
                print_usage(&args[0]);
                std::process::exit(0);
            }
            arg if !arg.starts_with('-') && filename.is_none() => {
                filename = Some(arg.to_string());
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let filename = filename.unwrap_or_else(|| {
        print_usage(&args[0]);
        std::process::exit(1);
    });

    let image = match base {
        Some(base) => MemoryImage::load_binary_file(&filename, base)?,
        None => MemoryImage::load_intel_hex_file(&filename)?,
    };
    info!("{}: {}", filename, image);

    let annotations = match &annotation_file {
        Some(path) => Annotations::load_file(path)?,
        None => Annotations::whole_image_as_code(image.start(), image.end()),
    };

    debug!(
        "Output options: width={}, addresses={}, hex={}",
        options.data_line_width, options.show_addresses, options.dump_hex
    );

    let mut disasm = Disassembler::new(&image, &annotations.areas, annotations.symbols);
    disasm.set_output_options(options);

    let out: Box<dyn Write> = match &output_file {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    let mut sink = WriteSink::new(out);
    disasm.run(&mut sink)?;
    sink.into_inner().flush()?;

    Ok(())
}
