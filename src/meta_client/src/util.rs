// Copyright 2026 the nebula-br Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use nebula_br_common::config::split_addr;
use nebula_br_common::error::{BrError, Result};
use nebula_br_pb::meta::HostAddr;

pub fn host_addr_to_string(host: &HostAddr) -> String {
    format!("{}:{}", host.host, host.port)
}

pub fn parse_host_addr(addr: &str) -> Result<HostAddr> {
    let (host, port) = split_addr(addr)?;
    let port: i32 = port.parse().map_err(|_| BrError::AddressMalformed {
        addr: addr.to_owned(),
    })?;
    Ok(HostAddr {
        host: host.to_owned(),
        port,
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn test_host_addr_round_trip() {
        let addr = parse_host_addr("192.168.8.129:44500").unwrap();
        assert_eq!(addr.host, "192.168.8.129");
        assert_eq!(addr.port, 44500);
        assert_eq!(host_addr_to_string(&addr), "192.168.8.129:44500");
    }

    #[test]
    fn test_parse_rejects_bad_port() {
        assert_matches!(
            parse_host_addr("192.168.8.129:port"),
            Err(BrError::AddressMalformed { .. })
        );
        assert_matches!(
            parse_host_addr("192.168.8.129"),
            Err(BrError::AddressMalformed { .. })
        );
    }
}
