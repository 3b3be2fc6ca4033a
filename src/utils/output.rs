//! # 终端输出样式
//!
//! 统一的状态行前缀：`[OK]`、`[ERR]`、`[WARN]`、`[SKIP]`、`[*]`。
//! 数值计算模块不直接打印，诊断信息以字符串返回，由命令层通过这里输出。
//!
//! ## 依赖关系
//! - 被 `main.rs` 和 `commands/` 使用
//! - 使用 `colored` crate

use colored::Colorize;

pub fn print_success(msg: &str) {
    println!("{} {}", "[OK]".green().bold(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "[ERR]".red().bold(), msg);
}

pub fn print_warning(msg: &str) {
    println!("{} {}", "[WARN]".yellow().bold(), msg);
}

pub fn print_skip(msg: &str) {
    println!("{} {}", "[SKIP]".cyan().bold(), msg);
}

pub fn print_info(msg: &str) {
    println!("{} {}", "[*]".blue().bold(), msg);
}

/// 逐条输出构建过程中的诊断信息
pub fn print_notes(notes: &[String]) {
    for note in notes {
        print_info(note);
    }
}

/// 键值对，用于计算摘要
pub fn print_field(key: &str, value: impl std::fmt::Display) {
    println!("  {:<18} {}", format!("{}:", key).dimmed(), value);
}

/// 打印标题栏
pub fn print_header(title: &str) {
    let line = "─".repeat(60);
    println!("\n{}", line.dimmed());
    println!("  {}", title.bold());
    println!("{}\n", line.dimmed());
}

pub fn print_separator() {
    println!("{}", "─".repeat(60).dimmed());
}
