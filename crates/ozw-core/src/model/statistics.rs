// ── Statistics domain types ──
//
// Both statistics records are singletons: they exist as soon as their
// owner does and only ever fire `changed`.

use serde_json::Value as Json;

use crate::event::{EVENT_INSTANCE_STATISTICS_CHANGED, EVENT_NODE_STATISTICS_CHANGED};
use crate::store::{Events, Schema};

pub static INSTANCE_STATISTICS: Schema = Schema::leaf(
    "InstanceStatistics",
    Events::changed_only(EVENT_INSTANCE_STATISTICS_CHANGED),
);

pub static NODE_STATISTICS: Schema = Schema::leaf(
    "NodeStatistics",
    Events::changed_only(EVENT_NODE_STATISTICS_CHANGED),
);

entity_view!(
    /// Serial link counters of a controller.
    InstanceStatistics => INSTANCE_STATISTICS
);

impl InstanceStatistics<'_> {
    record_fields! {
        sof_cnt: u64 => "SOFCnt";
        ack_waiting: u64 => "ACKWaiting";
        read_aborts: u64 => "readAborts";
        bad_checksum: u64 => "badChecksum";
        read_cnt: u64 => "readCnt";
        write_cnt: u64 => "writeCnt";
        can_cnt: u64 => "CANCnt";
        nak_cnt: u64 => "NAKCnt";
        ack_cnt: u64 => "ACKCnt";
        oof_cnt: u64 => "OOFCnt";
        dropped: u64 => "dropped";
        retries: u64 => "retries";
        callbacks: u64 => "callbacks";
        badroutes: u64 => "badroutes";
        noack: u64 => "noack";
        netbusy: u64 => "netbusy";
        notidle: u64 => "notidle";
        txverified: u64 => "txverified";
        nondelivery: u64 => "nondelivery";
        routedbusy: u64 => "routedbusy";
        broadcast_read_cnt: u64 => "broadcastReadCnt";
        broadcast_write_cnt: u64 => "broadcastWriteCnt";
    }
}

entity_view!(
    /// Radio link statistics of one node.
    NodeStatistics => NODE_STATISTICS
);

node_child!(NodeStatistics);

impl<'a> NodeStatistics<'a> {
    record_fields! {
        [
            "route_1", "route_2", "route_3", "route_4",
            "rssi_1", "rssi_2", "rssi_3", "rssi_4", "rssi_5",
        ]
        ack_channel: u64 => "ackChannel";
        average_request_rtt: u64 => "averageRequestRTT";
        average_response_rtt: u64 => "averageResponseRTT";
        extended_tx_supported: bool => "extendedTXSupported";
        hops: u64 => "hops";
        last_failed_link_from: u64 => "lastFailedLinkFrom";
        last_failed_link_to: u64 => "lastFailedLinkTo";
        last_received_time_stamp: &'a Json => "lastRecievedTimeStamp";
        last_request_rtt: u64 => "lastRequestRTT";
        last_response_rtt: u64 => "lastResponseRTT";
        last_tx_channel: u64 => "lastTXChannel";
        quality: u64 => "quality";
        received_dup_packets: u64 => "receivedDupPackets";
        received_packets: u64 => "recievedPackets";
        received_unsolicited: u64 => "receivedUnsolicited";
        retries: u64 => "retries";
        route_scheme: &'a str => "routeScheme";
        route_speed: &'a str => "routeSpeed";
        route_tries: u64 => "routeTries";
        route_used: &'a Json => "routeUsed";
        send_count: u64 => "sendCount";
        sent_failed: u64 => "sentFailed";
        sent_time_stamp: &'a Json => "sentTS";
        tx_time: u64 => "txTime";
    }

    /// Last working route, as up to four repeater node ids.
    pub fn routes(&self) -> [Option<u64>; 4] {
        ["route_1", "route_2", "route_3", "route_4"]
            .map(|key| self.0.field(key).and_then(Json::as_u64))
    }

    /// Received signal strength per hop.
    pub fn rssi(&self) -> [Option<&'a Json>; 5] {
        ["rssi_1", "rssi_2", "rssi_3", "rssi_4", "rssi_5"].map(|key| self.0.field(key))
    }
}
