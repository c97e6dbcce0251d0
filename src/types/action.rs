use std::fmt;
use std::str::FromStr;

use super::error::UnknownVariant;
use super::pattern::Pattern;

/// The `type` attribute of an action element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionType {
    #[default]
    None,
    Rewrite,
    Redirect,
    CustomResponse,
    AbortRequest,
}

impl FromStr for ActionType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "rewrite" => Ok(Self::Rewrite),
            "redirect" => Ok(Self::Redirect),
            "customresponse" => Ok(Self::CustomResponse),
            "abortrequest" => Ok(Self::AbortRequest),
            _ => Err(UnknownVariant::new("action type", s)),
        }
    }
}

/// HTTP status used for redirects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RedirectType {
    #[default]
    Permanent,
    Found,
    SeeOther,
    Temporary,
}

impl RedirectType {
    #[must_use]
    pub fn status_code(self) -> u16 {
        match self {
            Self::Permanent => 301,
            Self::Found => 302,
            Self::SeeOther => 303,
            Self::Temporary => 307,
        }
    }
}

impl FromStr for RedirectType {
    type Err = UnknownVariant;

    /// Accepts variant names (any case) or their numeric status codes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "permanent" | "301" => Ok(Self::Permanent),
            "found" | "302" => Ok(Self::Found),
            "seeother" | "303" => Ok(Self::SeeOther),
            "temporary" | "307" => Ok(Self::Temporary),
            _ => Err(UnknownVariant::new("redirect type", s)),
        }
    }
}

impl fmt::Display for RedirectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.status_code())
    }
}

/// A fixed response written by a `CustomResponse` action.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CustomResponse {
    pub status_code: u16,
    pub sub_status_code: Option<u32>,
    pub status_reason: Option<String>,
    pub status_description: Option<String>,
}

/// What a rule does once its match and conditions pass.
#[derive(Debug, Clone)]
pub enum UrlAction {
    /// Leave the request alone.
    None,
    Rewrite {
        url: Pattern,
        append_query_string: bool,
        log_rewritten_url: bool,
    },
    Redirect {
        url: Pattern,
        append_query_string: bool,
        log_rewritten_url: bool,
        redirect_type: RedirectType,
    },
    CustomResponse(CustomResponse),
    AbortRequest,
}

impl UrlAction {
    #[must_use]
    pub fn action_type(&self) -> ActionType {
        match self {
            Self::None => ActionType::None,
            Self::Rewrite { .. } => ActionType::Rewrite,
            Self::Redirect { .. } => ActionType::Redirect,
            Self::CustomResponse(_) => ActionType::CustomResponse,
            Self::AbortRequest => ActionType::AbortRequest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_action_types() {
        assert_eq!("Rewrite".parse::<ActionType>(), Ok(ActionType::Rewrite));
        assert_eq!("REDIRECT".parse::<ActionType>(), Ok(ActionType::Redirect));
        assert_eq!("AbortRequest".parse::<ActionType>(), Ok(ActionType::AbortRequest));
        assert_eq!(
            "customResponse".parse::<ActionType>(),
            Ok(ActionType::CustomResponse)
        );
        assert_eq!("None".parse::<ActionType>(), Ok(ActionType::None));
        assert!("Proxy".parse::<ActionType>().is_err());
    }

    #[test]
    fn redirect_type_names_and_codes() {
        assert_eq!("Found".parse::<RedirectType>(), Ok(RedirectType::Found));
        assert_eq!("307".parse::<RedirectType>(), Ok(RedirectType::Temporary));
        assert!("308".parse::<RedirectType>().is_err());
        assert_eq!(RedirectType::default().status_code(), 301);
        assert_eq!(RedirectType::SeeOther.to_string(), "303");
    }

    #[test]
    fn action_type_of_variants() {
        assert_eq!(UrlAction::AbortRequest.action_type(), ActionType::AbortRequest);
        let redirect = UrlAction::Redirect {
            url: Pattern::literal("/x"),
            append_query_string: true,
            log_rewritten_url: false,
            redirect_type: RedirectType::Found,
        };
        assert_eq!(redirect.action_type(), ActionType::Redirect);
    }
}
