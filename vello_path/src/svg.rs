// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! SVG path data.
//!
//! Arc rotations are written in degrees, as SVG does, and converted to
//! radians on the way in.

use core::fmt;
use core::str::FromStr;

use crate::path::{Command, Path};
use crate::{Config, Error, Point, Result};

struct Lexer<'a> {
    data: &'a str,
    ix: usize,
}

impl<'a> Lexer<'a> {
    fn new(data: &'a str) -> Self {
        Lexer { data, ix: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.data.as_bytes().get(self.ix).copied()
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if !matches!(c, b' ' | b'\t' | b'\n' | b'\r' | b'\x0c') {
                break;
            }
            self.ix += 1;
        }
    }

    /// Skips whitespace with at most one comma in it.
    fn skip_separator(&mut self) {
        self.skip_ws();
        if self.peek() == Some(b',') {
            self.ix += 1;
            self.skip_ws();
        }
    }

    fn skip_digits(&mut self) -> usize {
        let start = self.ix;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.ix += 1;
        }
        self.ix - start
    }

    fn get_number(&mut self) -> Result<f64> {
        self.skip_separator();
        let start = self.ix;
        if matches!(self.peek(), Some(b'+' | b'-')) {
            self.ix += 1;
        }
        let mut digits = self.skip_digits();
        if self.peek() == Some(b'.') {
            self.ix += 1;
            digits += self.skip_digits();
        }
        if digits == 0 {
            self.ix = start;
            return Err(Error::ExpectedNumber { offset: start });
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            let mantissa_end = self.ix;
            self.ix += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.ix += 1;
            }
            if self.skip_digits() == 0 {
                self.ix = mantissa_end;
            }
        }
        self.data[start..self.ix]
            .parse()
            .map_err(|_| Error::ExpectedNumber { offset: start })
    }

    /// Reads a single `0` or `1`; flags need no separator after them.
    fn get_flag(&mut self) -> Result<bool> {
        self.skip_separator();
        let flag = match self.peek() {
            Some(b'0') => false,
            Some(b'1') => true,
            _ => return Err(Error::ExpectedFlag { offset: self.ix }),
        };
        self.ix += 1;
        Ok(flag)
    }

    fn get_point(&mut self) -> Result<Point> {
        let x = self.get_number()?;
        let y = self.get_number()?;
        Ok(Point::new(x, y))
    }

    fn char_at(&self, offset: usize) -> char {
        self.data[offset..]
            .chars()
            .next()
            .unwrap_or(char::REPLACEMENT_CHARACTER)
    }
}

impl Path {
    /// Parses SVG path data.
    ///
    /// The full grammar is accepted: absolute and relative commands, repeated
    /// arguments without a repeated command letter, reflected control points
    /// for `S` and `T`, and arc flags without separators. Path data that does
    /// not begin with a move starts at the origin.
    pub fn from_svg(data: &str) -> Result<Self> {
        let mut lexer = Lexer::new(data);
        let mut path = Self::new();
        let mut last_cmd: Option<u8> = None;
        // Control points to reflect for a following `S` or `T`.
        let mut prev_cubic: Option<Point> = None;
        let mut prev_quad: Option<Point> = None;

        loop {
            lexer.skip_ws();
            let Some(c) = lexer.peek() else {
                break;
            };
            let offset = lexer.ix;
            let cmd = if c.is_ascii_alphabetic() {
                lexer.ix += 1;
                c
            } else {
                match last_cmd {
                    Some(b'M') => b'L',
                    Some(b'm') => b'l',
                    Some(cmd) if !cmd.eq_ignore_ascii_case(&b'z') => cmd,
                    _ => {
                        return Err(Error::MissingCommand {
                            found: lexer.char_at(offset),
                            offset,
                        })
                    }
                }
            };

            let current = path.pos();
            let relative = cmd.is_ascii_lowercase();
            let base = if relative { current } else { Point::ZERO };
            let reflect = |ctrl: Option<Point>| ctrl.map_or(current, |c| current * 2.0 - c);
            let mut cubic_ctrl = None;
            let mut quad_ctrl = None;
            match cmd.to_ascii_uppercase() {
                b'M' => path.move_to(base + lexer.get_point()?),
                b'L' => path.line_to(base + lexer.get_point()?),
                b'H' => {
                    let x = lexer.get_number()? + base.x;
                    path.line_to((x, current.y));
                }
                b'V' => {
                    let y = lexer.get_number()? + base.y;
                    path.line_to((current.x, y));
                }
                b'C' => {
                    let c1 = base + lexer.get_point()?;
                    let c2 = base + lexer.get_point()?;
                    let end = base + lexer.get_point()?;
                    path.cubic_to(c1, c2, end);
                    cubic_ctrl = Some(c2);
                }
                b'S' => {
                    let c1 = reflect(prev_cubic);
                    let c2 = base + lexer.get_point()?;
                    let end = base + lexer.get_point()?;
                    path.cubic_to(c1, c2, end);
                    cubic_ctrl = Some(c2);
                }
                b'Q' => {
                    let ctrl = base + lexer.get_point()?;
                    let end = base + lexer.get_point()?;
                    path.quad_to(ctrl, end);
                    quad_ctrl = Some(ctrl);
                }
                b'T' => {
                    let ctrl = reflect(prev_quad);
                    let end = base + lexer.get_point()?;
                    path.quad_to(ctrl, end);
                    quad_ctrl = Some(ctrl);
                }
                b'A' => {
                    let rx = lexer.get_number()?;
                    let ry = lexer.get_number()?;
                    let rotation = lexer.get_number()?;
                    let large_arc = lexer.get_flag()?;
                    let sweep = lexer.get_flag()?;
                    let end = base + lexer.get_point()?;
                    path.arc_to(rx, ry, rotation.to_radians(), large_arc, sweep, end);
                }
                b'Z' => path.close(),
                _ => {
                    return Err(Error::UnknownCommand {
                        command: char::from(cmd),
                        offset,
                    })
                }
            }
            prev_cubic = cubic_ctrl;
            prev_quad = quad_ctrl;
            last_cmd = Some(cmd);
        }
        Ok(path)
    }

    /// Writes the path as SVG path data with absolute commands.
    ///
    /// Numbers have at most `config.precision` decimals, and axis-aligned
    /// lines are written as `H` or `V`.
    pub fn to_svg(&self, config: &Config) -> String {
        Svg { path: self, config }.to_string()
    }
}

impl FromStr for Path {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_svg(s)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let config = Config::default();
        fmt::Display::fmt(
            &Svg {
                path: self,
                config: &config,
            },
            f,
        )
    }
}

struct Svg<'a> {
    path: &'a Path,
    config: &'a Config,
}

/// A number with trailing zeros trimmed.
struct Num(f64, usize);

impl fmt::Display for Num {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = format!("{:.*}", self.1, self.0);
        let s = if s.contains('.') {
            s.trim_end_matches('0').trim_end_matches('.')
        } else {
            &s
        };
        if s == "-0" {
            f.write_str("0")
        } else {
            f.write_str(s)
        }
    }
}

impl fmt::Display for Svg<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prec = self.config.precision;
        let n = |v: f64| Num(v, prec);
        for seg in self.path.segments() {
            match seg.cmd {
                Command::MoveTo(p) => write!(f, "M{} {}", n(p.x), n(p.y))?,
                Command::LineTo(p) => {
                    let same_x = self.config.equal(p.x, seg.start.x);
                    let same_y = self.config.equal(p.y, seg.start.y);
                    if same_x && !same_y {
                        write!(f, "V{}", n(p.y))?;
                    } else if same_y && !same_x {
                        write!(f, "H{}", n(p.x))?;
                    } else {
                        write!(f, "L{} {}", n(p.x), n(p.y))?;
                    }
                }
                Command::QuadTo(c, p) => {
                    write!(f, "Q{} {} {} {}", n(c.x), n(c.y), n(p.x), n(p.y))?;
                }
                Command::CubicTo(c1, c2, p) => write!(
                    f,
                    "C{} {} {} {} {} {}",
                    n(c1.x),
                    n(c1.y),
                    n(c2.x),
                    n(c2.y),
                    n(p.x),
                    n(p.y)
                )?,
                Command::ArcTo {
                    rx,
                    ry,
                    rotation,
                    large_arc,
                    sweep,
                    end,
                } => write!(
                    f,
                    "A{} {} {} {} {} {} {}",
                    n(rx),
                    n(ry),
                    n(rotation.to_degrees()),
                    u8::from(large_arc),
                    u8::from(sweep),
                    n(end.x),
                    n(end.y)
                )?,
                Command::Close => f.write_str("z")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use core::f64::consts::FRAC_PI_2;

    use super::Path;
    use crate::path::Command;
    use crate::{Config, Error, Point};

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn parse(data: &str) -> Vec<Command> {
        match Path::from_svg(data) {
            Ok(path) => path.commands().to_vec(),
            Err(err) => panic!("failed to parse {data:?}: {err}"),
        }
    }

    #[test]
    fn lines() {
        assert_eq!(
            parse("M10 20 l5 0 h5 v-5 H0 V0 z"),
            vec![
                Command::MoveTo(p(10.0, 20.0)),
                Command::LineTo(p(15.0, 20.0)),
                Command::LineTo(p(20.0, 20.0)),
                Command::LineTo(p(20.0, 15.0)),
                Command::LineTo(p(0.0, 15.0)),
                Command::LineTo(p(0.0, 0.0)),
                Command::Close,
            ]
        );
        assert_eq!(
            parse("M 1,2 L 3 , 4"),
            vec![Command::MoveTo(p(1.0, 2.0)), Command::LineTo(p(3.0, 4.0))]
        );
    }

    #[test]
    fn implicit_commands() {
        assert_eq!(
            parse("M0 0 1 1 2 2"),
            vec![
                Command::MoveTo(p(0.0, 0.0)),
                Command::LineTo(p(1.0, 1.0)),
                Command::LineTo(p(2.0, 2.0)),
            ]
        );
        assert_eq!(
            parse("m1 1 1 1z l0 1"),
            vec![
                Command::MoveTo(p(1.0, 1.0)),
                Command::LineTo(p(2.0, 2.0)),
                Command::Close,
                Command::MoveTo(p(1.0, 1.0)),
                Command::LineTo(p(1.0, 2.0)),
            ]
        );
        assert_eq!(
            parse("L3 4"),
            vec![Command::MoveTo(p(0.0, 0.0)), Command::LineTo(p(3.0, 4.0))]
        );
    }

    #[test]
    fn reflected_controls() {
        assert_eq!(
            parse("M0 0C1 1 2 1 3 0S5 -1 6 0")[2],
            Command::CubicTo(p(4.0, -1.0), p(5.0, -1.0), p(6.0, 0.0))
        );
        assert_eq!(
            parse("M0 0Q1 1 2 0T4 0")[2],
            Command::QuadTo(p(3.0, -1.0), p(4.0, 0.0))
        );
        // Without a preceding quadratic the control point is the current
        // point, which makes a line.
        assert_eq!(parse("M0 0T2 0")[1], Command::LineTo(p(2.0, 0.0)));
        assert_eq!(
            parse("M0 0c1 1 2 1 3 0s2 -1 3 0")[2],
            Command::CubicTo(p(4.0, -1.0), p(5.0, -1.0), p(6.0, 0.0))
        );
    }

    #[test]
    fn arcs() {
        let cmds = parse("M0 0a1 1 0 1050 0");
        assert_eq!(
            cmds[1],
            Command::ArcTo {
                rx: 25.0,
                ry: 25.0,
                rotation: 0.0,
                large_arc: true,
                sweep: false,
                end: p(50.0, 0.0),
            }
        );
        let Command::ArcTo { rotation, .. } = parse("M0 0A2 1 90 0 1 2 0")[1] else {
            panic!("expected an arc");
        };
        assert!((rotation - FRAC_PI_2).abs() < 1e-12);
        assert_eq!(parse("M10 10a5 5 0 0 1 10 0")[1].end(), Some(p(20.0, 10.0)));
    }

    #[test]
    fn numbers() {
        assert_eq!(
            parse("M1e1 -2.5E-1L.5.5"),
            vec![Command::MoveTo(p(10.0, -0.25)), Command::LineTo(p(0.5, 0.5))]
        );
        assert_eq!(parse("M+1-1")[0], Command::MoveTo(p(1.0, -1.0)));
    }

    #[test]
    fn errors() {
        assert_eq!(
            Path::from_svg("10 10"),
            Err(Error::MissingCommand {
                found: '1',
                offset: 0
            })
        );
        assert_eq!(
            Path::from_svg("M0 0 X1"),
            Err(Error::UnknownCommand {
                command: 'X',
                offset: 5
            })
        );
        assert_eq!(
            Path::from_svg("M0"),
            Err(Error::ExpectedNumber { offset: 2 })
        );
        assert_eq!(
            Path::from_svg("M0 0 A1 1 0 2 0 1 1"),
            Err(Error::ExpectedFlag { offset: 12 })
        );
        assert_eq!(
            Path::from_svg("M0 0 z 1 1"),
            Err(Error::MissingCommand {
                found: '1',
                offset: 7
            })
        );
        assert_eq!(Path::from_svg(""), Ok(Path::new()));
    }

    #[test]
    fn serialize() {
        let mut path = Path::new();
        path.move_to((0.0, 0.0));
        path.line_to((10.0, 0.0));
        path.line_to((10.0, -5.5));
        path.quad_to((1.0 / 3.0, 2.0), (0.0, 0.0));
        path.close();
        path.move_to((-0.0, 1e-12));
        path.arc_to(2.0, 1.0, FRAC_PI_2, false, true, (2.0, 0.0));
        assert_eq!(
            path.to_svg(&Config::default()),
            "M0 0H10V-5.5Q0.33333333 2 0 0zM0 0A2 1 90 0 1 2 0"
        );
        assert_eq!(path.to_string(), path.to_svg(&Config::default()));
        assert_eq!(
            path.to_svg(&Config::default().with_precision(2)),
            "M0 0H10V-5.5Q0.33 2 0 0zM0 0A2 1 90 0 1 2 0"
        );
    }

    #[test]
    fn parse_what_was_written() {
        let data = "M0 0L3 4C5 6 7 8 9 10Q11 12 13 14A5 3 30 1 0 20 20z";
        let path: Path = match data.parse() {
            Ok(path) => path,
            Err(err) => panic!("{err}"),
        };
        let written = path.to_string();
        assert_eq!(written, data);
        assert_eq!(Path::from_svg(&written), Ok(path));
    }
}
