// Bctl
// Copyright (C) Riff Labs Limited <team@riff.cc>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// long with this program.  If not, see <http://www.gnu.org/licenses/>.

pub fn markdown_print(markdown: &str) {
    termimad::print_text(markdown);
}

pub fn banner(msg: &str) {
    let markdown = format!("|:-|\n\
                            |{}|\n\
                            |-", msg);
    markdown_print(&markdown);
}

pub fn two_column_table(header_a: &str, header_b: &str, elements: &[(String, String)]) {
    let mut buffer = String::from("|:-|:-\n");
    buffer.push_str(&format!("|{}|{}\n", header_a, header_b));
    for (a, b) in elements.iter() {
        buffer.push_str("|-|-\n");
        buffer.push_str(&format!("|{}|{}\n", a, b));
    }
    buffer.push_str("|-|-\n");
    markdown_print(&buffer);
}

pub fn three_column_table(headers: (&str, &str, &str), rows: &[(String, String, String)]) {
    let mut buffer = String::from("|:-|:-|:-\n");
    buffer.push_str(&format!("|{}|{}|{}\n", headers.0, headers.1, headers.2));
    for (a, b, c) in rows.iter() {
        buffer.push_str("|-|-|-\n");
        buffer.push_str(&format!("|{}|{}|{}\n", a, b, c));
    }
    buffer.push_str("|-|-|-\n");
    markdown_print(&buffer);
}

pub fn captioned_display(caption: &str, body: &str) {
    banner(caption);
    println!();
    for line in body.lines() {
        println!("    {}", line);
    }
    println!();
}
