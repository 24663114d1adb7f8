//! IRC numeric replies understood by the session parser.
//!
//! Only numerics that a client-side session interprets (or deliberately
//! names) are listed here; any other three-digit code still tokenizes as
//! [`Command::Numeric`](crate::message::Command) and is simply unhandled.
//!
//! # Reference
//! - RFC 2812: Internet Relay Chat: Client Protocol
//! - Modern IRC documentation: <https://modern.ircdocs.horse/>

#![allow(non_camel_case_types)]

use std::str::FromStr;

/// IRC server response code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
#[non_exhaustive]
pub enum Response {
    // === Connection Registration ===
    /// 001 - Welcome to the IRC network
    RPL_WELCOME = 1,
    /// 002 - Your host is running version
    RPL_YOURHOST = 2,
    /// 003 - Server creation date
    RPL_CREATED = 3,
    /// 004 - Server info (name, version, user modes, channel modes)
    RPL_MYINFO = 4,
    /// 005 - Server supported features (ISUPPORT)
    RPL_ISUPPORT = 5,

    // === User/Channel replies ===
    /// 221 - User mode string
    RPL_UMODEIS = 221,
    /// 301 - Target is away
    RPL_AWAY = 301,
    /// 305 - You are no longer marked as away
    RPL_UNAWAY = 305,
    /// 306 - You have been marked as away
    RPL_NOWAWAY = 306,
    /// 311 - WHOIS user line
    RPL_WHOISUSER = 311,
    /// 315 - End of WHO
    RPL_ENDOFWHO = 315,
    /// 318 - End of WHOIS
    RPL_ENDOFWHOIS = 318,
    /// 324 - Channel modes
    RPL_CHANNELMODEIS = 324,
    /// 329 - Channel creation time
    RPL_CREATIONTIME = 329,
    /// 331 - No topic set
    RPL_NOTOPIC = 331,
    /// 332 - Channel topic
    RPL_TOPIC = 332,
    /// 333 - Topic setter and time
    RPL_TOPICWHOTIME = 333,
    /// 341 - Invite sent
    RPL_INVITING = 341,
    /// 352 - WHO reply
    RPL_WHOREPLY = 352,
    /// 353 - NAMES reply
    RPL_NAMREPLY = 353,
    /// 366 - End of NAMES
    RPL_ENDOFNAMES = 366,
    /// 367 - Ban list entry
    RPL_BANLIST = 367,
    /// 368 - End of ban list
    RPL_ENDOFBANLIST = 368,
    /// 372 - MOTD line
    RPL_MOTD = 372,
    /// 375 - MOTD start
    RPL_MOTDSTART = 375,
    /// 376 - End of MOTD
    RPL_ENDOFMOTD = 376,
    /// 396 - Displayed host changed
    RPL_HOSTHIDDEN = 396,

    // === Errors ===
    /// 401 - No such nick/channel
    ERR_NOSUCHNICK = 401,
    /// 403 - No such channel
    ERR_NOSUCHCHANNEL = 403,
    /// 421 - Unknown command
    ERR_UNKNOWNCOMMAND = 421,
    /// 422 - MOTD file missing
    ERR_NOMOTD = 422,
    /// 432 - Erroneous nickname
    ERR_ERRONEOUSNICKNAME = 432,
    /// 433 - Nickname is already in use
    ERR_NICKNAMEINUSE = 433,
    /// 436 - Nickname collision
    ERR_NICKCOLLISION = 436,
    /// 437 - Nick/channel temporarily unavailable
    ERR_UNAVAILRESOURCE = 437,
    /// 442 - You're not on that channel
    ERR_NOTONCHANNEL = 442,
    /// 451 - You have not registered
    ERR_NOTREGISTERED = 451,
    /// 464 - Password incorrect
    ERR_PASSWDMISMATCH = 464,
    /// 465 - You are banned from this server
    ERR_YOUREBANNEDCREEP = 465,
    /// 471 - Cannot join channel (+l)
    ERR_CHANNELISFULL = 471,
    /// 473 - Cannot join channel (+i)
    ERR_INVITEONLYCHAN = 473,
    /// 474 - Cannot join channel (+b)
    ERR_BANNEDFROMCHAN = 474,
    /// 475 - Cannot join channel (+k)
    ERR_BADCHANNELKEY = 475,
    /// 482 - You're not channel operator
    ERR_CHANOPRIVSNEEDED = 482,
}

impl Response {
    /// Returns the numeric code as u16
    #[inline]
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Creates a Response from a numeric code
    pub fn from_code(code: u16) -> Option<Response> {
        Some(match code {
            1 => Response::RPL_WELCOME,
            2 => Response::RPL_YOURHOST,
            3 => Response::RPL_CREATED,
            4 => Response::RPL_MYINFO,
            5 => Response::RPL_ISUPPORT,
            221 => Response::RPL_UMODEIS,
            301 => Response::RPL_AWAY,
            305 => Response::RPL_UNAWAY,
            306 => Response::RPL_NOWAWAY,
            311 => Response::RPL_WHOISUSER,
            315 => Response::RPL_ENDOFWHO,
            318 => Response::RPL_ENDOFWHOIS,
            324 => Response::RPL_CHANNELMODEIS,
            329 => Response::RPL_CREATIONTIME,
            331 => Response::RPL_NOTOPIC,
            332 => Response::RPL_TOPIC,
            333 => Response::RPL_TOPICWHOTIME,
            341 => Response::RPL_INVITING,
            352 => Response::RPL_WHOREPLY,
            353 => Response::RPL_NAMREPLY,
            366 => Response::RPL_ENDOFNAMES,
            367 => Response::RPL_BANLIST,
            368 => Response::RPL_ENDOFBANLIST,
            372 => Response::RPL_MOTD,
            375 => Response::RPL_MOTDSTART,
            376 => Response::RPL_ENDOFMOTD,
            396 => Response::RPL_HOSTHIDDEN,
            401 => Response::ERR_NOSUCHNICK,
            403 => Response::ERR_NOSUCHCHANNEL,
            421 => Response::ERR_UNKNOWNCOMMAND,
            422 => Response::ERR_NOMOTD,
            432 => Response::ERR_ERRONEOUSNICKNAME,
            433 => Response::ERR_NICKNAMEINUSE,
            436 => Response::ERR_NICKCOLLISION,
            437 => Response::ERR_UNAVAILRESOURCE,
            442 => Response::ERR_NOTONCHANNEL,
            451 => Response::ERR_NOTREGISTERED,
            464 => Response::ERR_PASSWDMISMATCH,
            465 => Response::ERR_YOUREBANNEDCREEP,
            471 => Response::ERR_CHANNELISFULL,
            473 => Response::ERR_INVITEONLYCHAN,
            474 => Response::ERR_BANNEDFROMCHAN,
            475 => Response::ERR_BADCHANNELKEY,
            482 => Response::ERR_CHANOPRIVSNEEDED,
            _ => return None,
        })
    }

    /// Check if this is an error response (4xx, 5xx)
    #[inline]
    pub fn is_error(&self) -> bool {
        (400..600).contains(&self.code())
    }

    /// Check if this is a connection registration response (001-099)
    #[inline]
    pub fn is_registration(&self) -> bool {
        self.code() < 100
    }

    /// Whether a nickname rejection numeric; these matter while registering.
    #[inline]
    pub fn is_nick_rejection(&self) -> bool {
        matches!(
            self,
            Response::ERR_ERRONEOUSNICKNAME
                | Response::ERR_NICKNAMEINUSE
                | Response::ERR_NICKCOLLISION
                | Response::ERR_UNAVAILRESOURCE
        )
    }
}

impl FromStr for Response {
    type Err = ParseResponseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code: u16 = s.parse().map_err(|_| ParseResponseError::InvalidFormat)?;
        Response::from_code(code).ok_or(ParseResponseError::UnknownCode(code))
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:03}", self.code())
    }
}

/// Error when parsing a response code
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ParseResponseError {
    /// The string was not a valid number
    #[error("invalid response code format")]
    InvalidFormat,
    /// The numeric code is not a known response
    #[error("unknown response code: {0}")]
    UnknownCode(u16),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_codes() {
        assert_eq!(Response::RPL_TOPIC.code(), 332);
        assert_eq!(Response::from_code(333), Some(Response::RPL_TOPICWHOTIME));
        assert_eq!(Response::from_code(999), None);
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("001".parse::<Response>().unwrap(), Response::RPL_WELCOME);
        assert_eq!(format!("{}", Response::RPL_ISUPPORT), "005");
        assert_eq!("abc".parse::<Response>(), Err(ParseResponseError::InvalidFormat));
        assert_eq!("999".parse::<Response>(), Err(ParseResponseError::UnknownCode(999)));
    }

    #[test]
    fn test_classification() {
        assert!(Response::ERR_NICKNAMEINUSE.is_error());
        assert!(Response::ERR_NICKNAMEINUSE.is_nick_rejection());
        assert!(!Response::ERR_BANNEDFROMCHAN.is_nick_rejection());
        assert!(Response::RPL_ISUPPORT.is_registration());
        assert!(!Response::RPL_TOPIC.is_registration());
    }
}
