use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{exit, Command};

use clap::{Parser, Subcommand};

use banh_compiler::{compile_with_dumps, DumpOptions};

mod congthuc;
use congthuc::CongThuc;

#[derive(Parser, Debug)]
#[command(name = "banhc")]
#[command(version = banh_compiler::VERSION)]
#[command(about = "Trình biên dịch bánh — nướng, ăn và hấp")]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// In công thức đã tải
    #[arg(long = "in-cong-thuc", global = true)]
    in_cong_thuc: bool,

    /// In từng ký tự của tệp nguồn
    #[arg(long = "in-ky-tu", global = true)]
    in_ky_tu: bool,

    /// In các token sau khi tách từ
    #[arg(long = "in-token", global = true)]
    in_token: bool,

    /// In cây cú pháp sau khi phân tích
    #[arg(long = "in-parse", global = true)]
    in_parse: bool,

    /// In cây cú pháp sau khi kiểm tra kiểu
    #[arg(long = "in-chuong-trinh", global = true)]
    in_chuong_trinh: bool,

    /// In mã LLVM IR được tạo
    #[arg(long = "in-ir", global = true)]
    in_ir: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Nướng bánh: biên dịch và liên kết thành tệp thực thi
    Nuong,
    /// Ăn bánh: chạy tệp thực thi đã nướng
    An,
    /// Hấp bánh: chạy trực tiếp qua 'lli'
    Hap,
}

fn main() {
    let cli = Cli::parse();

    let recipe = match CongThuc::load("congthuc.toml") {
        Ok(recipe) => recipe,
        Err(e) => {
            eprintln!("{}", e);
            exit(1);
        }
    };
    if cli.in_cong_thuc {
        println!("📦 Gói: {}", recipe.goi.ten);
        println!("🔖 Phiên bản: {}", recipe.goi.ban);
        println!("✍️ Tác giả: {:?}", recipe.goi.tacgia);
        println!("📂 Điểm vào: {}", recipe.bandung.diemvao);
        println!("📦 Xuất ra: {}", recipe.bandung.xuat);
    }

    let dumps = DumpOptions {
        chars: cli.in_ky_tu,
        tokens: cli.in_token,
        parse: cli.in_parse,
        program: cli.in_chuong_trinh,
        ir: cli.in_ir,
    };

    match cli.command {
        Cmd::Nuong => nuong(&recipe, dumps),
        Cmd::An => an(&recipe),
        Cmd::Hap => hap(&recipe, dumps),
    }
}

fn compile_entry(recipe: &CongThuc, dumps: DumpOptions) -> String {
    let source = match fs::read_to_string(&recipe.bandung.diemvao) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Không thể đọc '{}': {}", recipe.bandung.diemvao, e);
            exit(1);
        }
    };
    match compile_with_dumps(&source, dumps) {
        Ok(ir) => ir,
        Err(e) => {
            eprintln!("{}", e);
            exit(1);
        }
    }
}

/// Runs an external tool, surfacing its output when it fails.
fn run_tool(program: &str, args: &[&str]) {
    let output = match Command::new(program).args(args).output() {
        Ok(output) => output,
        Err(e) => {
            eprintln!("Gặp sự cố chạy lệnh '{}': {}", program, e);
            exit(1);
        }
    };
    if !output.status.success() {
        print!("{}", String::from_utf8_lossy(&output.stdout));
        eprint!("{}", String::from_utf8_lossy(&output.stderr));
        eprintln!("Gặp sự cố chạy lệnh '{}': {}", program, output.status);
        exit(1);
    }
}

fn nuong(recipe: &CongThuc, dumps: DumpOptions) {
    println!("🔥 Đang nướng bánh...");
    let ir = compile_entry(recipe, dumps);

    let output = &recipe.bandung.xuat;
    let ll_file = format!("{}.ll", output);
    let obj_file = format!("{}.o", output);
    if let Err(e) = fs::write(&ll_file, &ir) {
        eprintln!("Gặp sự cố khi tạo file IR: {}", e);
        exit(1);
    }

    run_tool("llc", &["-filetype=obj", "-o", &obj_file, &ll_file]);
    run_tool("clang", &[&obj_file, "-o", output]);

    println!("✅ Bánh đã chín! Có thể ăn được rồi.");
}

fn an(recipe: &CongThuc) {
    println!("🍽️ Đang ăn bánh...");
    let status = match Command::new(&recipe.bandung.xuat).status() {
        Ok(status) => status,
        Err(e) => {
            eprintln!("Gặp sự cố chạy chương trình: {}", e);
            exit(1);
        }
    };
    exit(status.code().unwrap_or(1));
}

fn hap(recipe: &CongThuc, dumps: DumpOptions) {
    println!("🥟 Đang hấp bánh...");
    let ir = compile_entry(recipe, dumps);

    let out_path = Path::new(&recipe.bandung.xuat);
    let dir = out_path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let mut temp = match tempfile::Builder::new().suffix(".ll").tempfile_in(dir) {
        Ok(temp) => temp,
        Err(e) => {
            eprintln!("Gặp sự cố khi tạo file tạm thời: {}", e);
            exit(1);
        }
    };
    if let Err(e) = temp.write_all(ir.as_bytes()) {
        eprintln!("Gặp sự cố khi viết file tạm thời: {}", e);
        exit(1);
    }

    let temp_path = temp.path().to_string_lossy().into_owned();
    let output = match Command::new("lli").arg(&temp_path).output() {
        Ok(output) => output,
        Err(e) => {
            eprintln!("Gặp sự cố khi chạy 'lli': {}", e);
            exit(1);
        }
    };
    print!("{}", String::from_utf8_lossy(&output.stdout));
    if !output.status.success() {
        eprint!("{}", String::from_utf8_lossy(&output.stderr));
        eprintln!("Gặp sự cố khi chạy 'lli': {}", output.status);
        exit(1);
    }
}
