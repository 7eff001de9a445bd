//! Plain SMTP delivery
//!
//! One connection per message: greeting, `EHLO`, optional `AUTH LOGIN`,
//! envelope, `DATA`, `QUIT`. Every reply is checked and the first
//! unexpected one aborts delivery with [`LoggerError::Smtp`].

use super::event::NotificationEvent;
use crate::core::error::{LoggerError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::fmt;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

pub const DEFAULT_SMTP_TIMEOUT: Duration = Duration::from_secs(10);

/// SMTP login
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

/// Mail server and envelope addresses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailTarget {
    pub host: String,
    pub port: u16,
    pub from: String,
    pub to: String,
    pub credentials: Option<Credentials>,
}

impl MailTarget {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            from: from.into(),
            to: to.into(),
            credentials: None,
        }
    }

    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }
}

/// Delivers one notification to a mail target
pub trait Transport: Send {
    fn deliver(&mut self, target: &MailTarget, event: &NotificationEvent) -> Result<()>;
}

/// Transport speaking SMTP over a plain TCP connection
#[derive(Debug, Clone)]
pub struct SmtpTransport {
    timeout: Duration,
    client_name: String,
}

impl SmtpTransport {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_SMTP_TIMEOUT,
            client_name: "localhost".to_string(),
        }
    }

    /// Connect, read and write timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Name announced in `EHLO`
    #[must_use]
    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = name.into();
        self
    }

    fn connect(&self, target: &MailTarget) -> Result<TcpStream> {
        let address = format!("{}:{}", target.host, target.port);
        let addrs = address
            .to_socket_addrs()
            .map_err(|e| LoggerError::io_operation("resolving mail server", &address, e))?;

        let mut last_error = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.timeout) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(self.timeout))?;
                    stream.set_write_timeout(Some(self.timeout))?;
                    stream.set_nodelay(true)?;
                    return Ok(stream);
                }
                Err(e) => last_error = Some(e),
            }
        }

        Err(match last_error {
            Some(e) => LoggerError::io_operation("connecting to mail server", &address, e),
            None => LoggerError::smtp("connect", format!("no address for {}", address)),
        })
    }
}

impl Default for SmtpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for SmtpTransport {
    fn deliver(&mut self, target: &MailTarget, event: &NotificationEvent) -> Result<()> {
        let stream = self.connect(target)?;
        let mut session = Session {
            reader: BufReader::new(stream.try_clone()?),
            writer: stream,
        };

        session.expect("greeting", &[220])?;

        session.command("EHLO", &format!("EHLO {}", self.client_name))?;
        if let Err(ehlo_error) = session.expect("EHLO", &[250]) {
            session.command("HELO", &format!("HELO {}", self.client_name))?;
            session.expect("HELO", &[250]).map_err(|_| ehlo_error)?;
        }

        if let Some(credentials) = &target.credentials {
            session.command("AUTH", "AUTH LOGIN")?;
            session.expect("AUTH", &[334])?;
            session.command("AUTH", &STANDARD.encode(&credentials.user))?;
            session.expect("AUTH", &[334])?;
            session.command("AUTH", &STANDARD.encode(&credentials.password))?;
            session.expect("AUTH", &[235])?;
        }

        session.command("MAIL FROM", &format!("MAIL FROM:<{}>", target.from))?;
        session.expect("MAIL FROM", &[250])?;
        session.command("RCPT TO", &format!("RCPT TO:<{}>", target.to))?;
        session.expect("RCPT TO", &[250, 251])?;
        session.command("DATA", "DATA")?;
        session.expect("DATA", &[354])?;

        let message = compose(target, event);
        session
            .writer
            .write_all(message.as_bytes())
            .map_err(|e| LoggerError::io_operation("sending message body", &target.host, e))?;
        session.expect("DATA", &[250])?;

        session.command("QUIT", "QUIT")?;
        session.expect("QUIT", &[221])?;
        Ok(())
    }
}

struct Session {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl Session {
    fn command(&mut self, stage: &str, line: &str) -> Result<()> {
        self.writer
            .write_all(line.as_bytes())
            .and_then(|()| self.writer.write_all(b"\r\n"))
            .and_then(|()| self.writer.flush())
            .map_err(|e| LoggerError::io_operation(format!("sending {}", stage), line, e))
    }

    /// Read a possibly multi-line reply and check its code
    fn expect(&mut self, stage: &str, accepted: &[u16]) -> Result<u16> {
        let mut reply = String::new();
        loop {
            let mut line = String::new();
            let read = self
                .reader
                .read_line(&mut line)
                .map_err(|e| LoggerError::io_operation(format!("reading {} reply", stage), "", e))?;
            if read == 0 {
                return Err(LoggerError::smtp(stage, "connection closed"));
            }
            let line = line.trim_end_matches(['\r', '\n']);
            reply.push_str(line);

            // "250-" continues, "250 " ends
            if line.as_bytes().get(3) == Some(&b'-') {
                reply.push('\n');
                continue;
            }
            break;
        }

        let code = reply
            .get(..3)
            .and_then(|digits| digits.parse::<u16>().ok())
            .ok_or_else(|| LoggerError::smtp(stage, reply.clone()))?;
        if accepted.contains(&code) {
            Ok(code)
        } else {
            Err(LoggerError::smtp(stage, reply))
        }
    }
}

/// Headers, dot-stuffed body and the terminating `.` line
fn compose(target: &MailTarget, event: &NotificationEvent) -> String {
    let subject: String = event
        .subject
        .chars()
        .filter(|c| *c != '\r' && *c != '\n')
        .collect();

    let mut message = String::with_capacity(event.body.len() + 256);
    message.push_str(&format!("From: <{}>\r\n", target.from));
    message.push_str(&format!("To: <{}>\r\n", target.to));
    message.push_str(&format!("Subject: {}\r\n", subject));
    message.push_str(&format!("Date: {}\r\n", chrono::Local::now().to_rfc2822()));
    message.push_str("Content-Type: text/plain; charset=utf-8\r\n\r\n");

    for line in event.body.lines() {
        if line.starts_with('.') {
            message.push('.');
        }
        message.push_str(line);
        message.push_str("\r\n");
    }
    message.push_str(".\r\n");
    message
}
